//! Entrypoint for CLI
use std::{
    fs,
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use jack_compiler::{
    compile_class, trace::token_listing, CompileConf, CompileContext, CompileError,
};
use log::{error, info, LevelFilter};

/// FreeBSD EX_USAGE
const EX_USAGE: i32 = 64;

const SOURCE_EXT: &str = "jack";

#[derive(Debug, Parser)]
#[command(name = "jack", version, about = "Compiler for the Jack language")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Compile a source file, or every source file in a directory
    Compile {
        path: PathBuf,
        /// Also write the parse tree trace next to the code
        #[arg(long)]
        trace: bool,
        /// Prefix of generated control flow labels
        #[arg(long, default_value = "L")]
        label_prefix: String,
        /// Output directory, defaults to the directory of each source
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the tokens of a source file
    Tokens { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Compile {
        path: PathBuf,
        source: CompileError,
    },
    #[error("no .jack files found in {}", .0.display())]
    NoSources(PathBuf),
}

type CliResult<T> = Result<T, CliError>;

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("failed to initialise logger: {err}");
        process::exit(1);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            process::exit(EX_USAGE)
        }
        Err(err) => err.exit(),
    };

    if let Err(err) = run(cli) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.cmd {
        Cmd::Compile {
            path,
            trace,
            label_prefix,
            out_dir,
        } => {
            let conf = CompileConf {
                label_prefix: label_prefix.into(),
                trace,
            };
            run_compiler(&path, conf, out_dir.as_deref())
        }
        Cmd::Tokens { path } => run_tokenizer(&path),
    }
}

fn run_compiler(
    path: &Path,
    conf: CompileConf,
    out_dir: Option<&Path>,
) -> CliResult<()> {
    let sources = enumerate_sources(path)?
        .into_iter()
        .map(|path| read_source(&path).map(|text| (path, text)))
        .collect::<CliResult<Vec<_>>>()?;

    let mut ctx = CompileContext::new(conf);

    for (path, text) in &sources {
        info!("compiling {}", path.display());

        let class = compile_class(text, &mut ctx).map_err(|source| CliError::Compile {
            path: path.clone(),
            source,
        })?;

        let dir = out_dir
            .or_else(|| path.parent())
            .unwrap_or_else(|| Path::new("."));

        let code_path = dir.join(format!("{}.vm", class.name));
        write_output(&code_path, &class.render())?;
        info!("wrote {}", code_path.display());

        if let Some(trace) = &class.trace {
            let trace_path = dir.join(format!("{}.xml", class.name));
            write_output(&trace_path, trace)?;
            info!("wrote {}", trace_path.display());
        }
    }

    Ok(())
}

fn run_tokenizer(path: &Path) -> CliResult<()> {
    let text = read_source(path)?;
    let listing = token_listing(&text).map_err(|source| CliError::Compile {
        path: path.to_path_buf(),
        source,
    })?;
    print!("{listing}");
    Ok(())
}

/// A single source file, or the sorted source files of a directory.
fn enumerate_sources(path: &Path) -> CliResult<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let io_err = |source: std::io::Error| CliError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut sources = Vec::new();
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry_path = entry.map_err(io_err)?.path();
        if entry_path.is_file() && entry_path.extension().map_or(false, |ext| ext == SOURCE_EXT) {
            sources.push(entry_path);
        }
    }

    if sources.is_empty() {
        return Err(CliError::NoSources(path.to_path_buf()));
    }

    sources.sort();
    Ok(sources)
}

fn read_source(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(path: &Path, contents: &str) -> CliResult<()> {
    fs::write(path, contents).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}
