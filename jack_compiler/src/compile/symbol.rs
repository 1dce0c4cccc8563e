//! Scoped symbol tables.
use super::ir::Segment;
use crate::error::{CompileError, CompileResult};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Kind of declaration a name was bound by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `var` inside a subroutine body.
    Local,
    /// Subroutine parameter.
    Parameter,
    /// `static` class variable, shared by all instances.
    Static,
    /// `field` class variable, one per instance.
    Field,
    Class,
    Subroutine,
}

impl Category {
    /// Indexed categories occupy a numbered slot in a segment.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.counter().is_some()
    }

    /// Segment that variables of this category live in.
    #[rustfmt::skip]
    pub fn segment(&self) -> Option<Segment> {
        match self {
            Category::Local     => Some(Segment::Local),
            Category::Parameter => Some(Segment::Argument),
            Category::Static    => Some(Segment::Static),
            Category::Field     => Some(Segment::This),
            Category::Class | Category::Subroutine => None,
        }
    }

    /// Declarations of these categories belong to the subroutine scope.
    #[inline]
    pub fn is_subroutine_level(&self) -> bool {
        matches!(self, Category::Local | Category::Parameter)
    }

    fn counter(&self) -> Option<usize> {
        match self {
            Category::Local => Some(0),
            Category::Parameter => Some(1),
            Category::Static => Some(2),
            Category::Field => Some(3),
            Category::Class | Category::Subroutine => None,
        }
    }
}

/// Kind of subroutine, stored in the declared type of a
/// [`Category::Subroutine`] binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "constructor" => Some(Self::Constructor),
            "function" => Some(Self::Function),
            "method" => Some(Self::Method),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constructor => "constructor",
            Self::Function => "function",
            Self::Method => "method",
        }
    }
}

/// Symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: SmolStr,
    pub category: Category,
    /// Primitive or class name. For subroutines, the subroutine kind.
    pub ty: SmolStr,
    /// Assigned on insertion, only for indexed categories.
    pub slot: Option<u16>,
}

impl Binding {
    pub fn new(name: impl Into<SmolStr>, category: Category, ty: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            category,
            ty: ty.into(),
            slot: None,
        }
    }

    /// Segment and slot of a variable binding.
    pub fn location(&self) -> Option<(Segment, u16)> {
        if !self.category.is_indexed() {
            return None;
        }
        Some((self.category.segment()?, self.slot?))
    }

    pub fn subroutine_kind(&self) -> Option<SubroutineKind> {
        match self.category {
            Category::Subroutine => SubroutineKind::parse(self.ty.as_str()),
            _ => None,
        }
    }
}

/// Bindings of a single scope, with one slot counter per indexed category.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<SmolStr, Binding>,
    counters: [u16; 4],
}

impl SymbolTable {
    /// Store the binding, assigning it the next slot of its category.
    ///
    /// A later declaration with the same name replaces the earlier one.
    pub fn insert(&mut self, mut binding: Binding) -> CompileResult<&Binding> {
        if let Some(counter) = binding.category.counter() {
            let slot = self.counters[counter];
            self.counters[counter] = slot.checked_add(1).ok_or_else(|| CompileError::SlotOverflow {
                name: binding.name.clone(),
            })?;
            binding.slot = Some(slot);
        }

        let name = binding.name.clone();
        self.symbols.insert(name.clone(), binding);
        Ok(&self.symbols[&name])
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.symbols.get(name)
    }

    #[inline]
    pub fn slot_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).and_then(|binding| binding.slot)
    }

    /// Skip a slot of the given category without binding a name to it.
    pub fn reserve(&mut self, category: Category) {
        if let Some(counter) = category.counter() {
            self.counters[counter] = self.counters[counter].saturating_add(1);
        }
    }

    /// Number of slots handed out for the category so far.
    pub fn count(&self, category: Category) -> u16 {
        category.counter().map(|c| self.counters[c]).unwrap_or(0)
    }
}

/// The two lexical levels of the language.
///
/// Nesting is fixed by the grammar: a class scope for the
/// whole class body, and at most one subroutine scope inside it.
#[derive(Debug, Default)]
pub struct Scopes {
    class: Option<SymbolTable>,
    subroutine: Option<SymbolTable>,
}

impl Scopes {
    pub fn open_class(&mut self) {
        self.class = Some(SymbolTable::default());
        self.subroutine = None;
    }

    pub fn close_class(&mut self) {
        self.class = None;
        self.subroutine = None;
    }

    pub fn open_subroutine(&mut self) {
        self.subroutine = Some(SymbolTable::default());
    }

    pub fn close_subroutine(&mut self) {
        self.subroutine = None;
    }

    /// Bind a declaration in the scope its category belongs to.
    pub fn declare(&mut self, binding: Binding) -> CompileResult<Binding> {
        let scope = if binding.category.is_subroutine_level() {
            self.subroutine.as_mut()
        } else {
            self.class.as_mut()
        };

        match scope {
            Some(scope) => scope.insert(binding).map(Binding::clone),
            None => Err(CompileError::NoScope { name: binding.name }),
        }
    }

    /// Reserve a subroutine level slot.
    pub fn reserve(&mut self, category: Category) {
        if let Some(scope) = self.subroutine.as_mut() {
            scope.reserve(category);
        }
    }

    /// Lookup a name, nearest enclosing scope first.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.subroutine
            .iter()
            .chain(self.class.iter())
            .find_map(|scope| scope.lookup(name))
    }

    /// Lookup a name in the class scope only.
    pub fn lookup_class(&self, name: &str) -> Option<&Binding> {
        self.class.as_ref().and_then(|scope| scope.lookup(name))
    }
}
