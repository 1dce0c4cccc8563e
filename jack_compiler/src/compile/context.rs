use smol_str::SmolStr;
use std::collections::HashMap;

/// Options for a compilation run.
#[derive(Debug, Clone)]
pub struct CompileConf {
    /// Prefix of synthesized control flow labels.
    pub label_prefix: SmolStr,
    /// Record the parse tree trace while compiling.
    pub trace: bool,
}

impl Default for CompileConf {
    fn default() -> Self {
        Self {
            label_prefix: SmolStr::new("L"),
            trace: false,
        }
    }
}

/// State shared by every class compiled in one run.
///
/// Holds the object size of each class seen so far and the
/// label counter, which is never reset between files.
#[derive(Debug)]
pub struct CompileContext {
    conf: CompileConf,
    /// Size in storage cells, keyed by type name.
    type_sizes: HashMap<SmolStr, u16>,
    label_counter: usize,
}

impl CompileContext {
    pub fn new(conf: CompileConf) -> Self {
        let type_sizes = ["int", "boolean", "char"]
            .into_iter()
            .map(|name| (SmolStr::new(name), 1))
            .collect();

        Self {
            conf,
            type_sizes,
            label_counter: 0,
        }
    }

    /// Configuration that was used to instantiate the context.
    pub fn config(&self) -> &CompileConf {
        &self.conf
    }

    /// Number of cells an instance of the type occupies.
    ///
    /// Returns `None` for classes that have not been declared yet.
    pub fn type_size(&self, name: &str) -> Option<u16> {
        self.type_sizes.get(name).copied()
    }

    pub fn set_class_size(&mut self, name: SmolStr, size: u16) {
        self.type_sizes.insert(name, size);
    }

    /// Cells a variable of the given type takes up inside an object.
    ///
    /// Object typed variables hold a reference, which is one cell.
    pub fn cell_size(&self, ty: &str) -> u16 {
        match ty {
            "int" | "boolean" | "char" => self.type_size(ty).unwrap_or(1),
            _ => 1,
        }
    }

    /// Produce a label that is unique for the lifetime of the context.
    pub fn next_label(&mut self) -> SmolStr {
        let label = SmolStr::from(format!("{}{}", self.conf.label_prefix, self.label_counter));
        self.label_counter += 1;
        label
    }

    /// Number of labels handed out so far.
    pub fn label_count(&self) -> usize {
        self.label_counter
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        CompileContext::new(CompileConf::default())
    }
}
