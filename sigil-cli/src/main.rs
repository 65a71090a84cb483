//! Command-line interface for sigil
//! This binary compiles sigil documents to HTML, one at a time or as a project.
//!
//! Usage:
//!   sigil `<path>`                          - Compile one document to stdout
//!   sigil `<path>`... --out-dir `<dir>`     - Compile a project, one file per document
//!   sigil `<path>` --show-tokens --show-ast  - Print debug dumps before the output

use clap::{Arg, ArgAction, ArgMatches, Command};
use sigil_config::{ConfigError, DumpFormat, Loader, SigilConfig};
use sigil_parser::sigil::ast::{CompileError, Diagnostic};
use sigil_parser::sigil::project::Project;
use sigil_parser::sigil::registry::MacroRegistry;
use sigil_parser::sigil::store::MemoryStore;
use sigil_parser::{compile, CompileOutput};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Io { path: PathBuf, source: std::io::Error },
    Config(ConfigError),
    Compile(CompileError),
    Dump(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            CliError::Config(e) => write!(f, "configuration error: {}", e),
            CliError::Compile(e) => write!(f, "compile error: {}", e),
            CliError::Dump(e) => write!(f, "could not serialize dump: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        CliError::Compile(e)
    }
}

fn command() -> Command {
    Command::new("sigil")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile sigil markup documents to HTML")
        .arg_required_else_help(true)
        .arg(
            Arg::new("paths")
                .help("Documents to compile; more than one compiles them as a project")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("body-only")
                .long("body-only")
                .help("Emit only the rendered body, without the HTML shell")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show-tokens")
                .long("show-tokens")
                .help("Print the token stream")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show-ast")
                .long("show-ast")
                .help("Print the post-processed AST")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show-parse")
                .long("show-parse")
                .help("Print one line per parsed macro")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("dump-format")
                .long("dump-format")
                .help("Format of token and AST dumps")
                .value_parser(["text", "json", "yaml"]),
        )
        .arg(
            Arg::new("index")
                .long("index")
                .help("Document reachability is checked from (default: index)"),
        )
        .arg(
            Arg::new("out-dir")
                .long("out-dir")
                .short('o')
                .help("Write one HTML file per document into this directory"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log compiler stages to stderr")
                .action(ArgAction::SetTrue),
        )
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SIGIL_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<SigilConfig, CliError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if matches.get_flag("body-only") {
        loader = loader.set_override("compile.body_only", true)?;
    }
    for (flag, key) in [
        ("show-tokens", "debug.show_tokens"),
        ("show-ast", "debug.show_ast"),
        ("show-parse", "debug.show_parse"),
    ] {
        if matches.get_flag(flag) {
            loader = loader.set_override(key, true)?;
        }
    }
    if let Some(format) = matches.get_one::<String>("dump-format") {
        loader = loader.set_override("debug.dump_format", format.as_str())?;
    }
    if let Some(index) = matches.get_one::<String>("index") {
        loader = loader.set_override("project.index", index.as_str())?;
    }
    if let Some(dir) = matches.get_one::<String>("out-dir") {
        loader = loader.set_override("output.out_dir", dir.as_str())?;
    }
    Ok(loader.build()?)
}

/// Document name of a path: its file stem
fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn serialize<T: serde::Serialize>(value: &T, format: DumpFormat) -> Result<String, CliError> {
    match format {
        DumpFormat::Yaml => serde_yaml::to_string(value).map_err(|e| CliError::Dump(e.to_string())),
        _ => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| CliError::Dump(e.to_string())),
    }
}

/// Debug dumps of one document, in the configured format
fn dumps(output: &CompileOutput, config: &SigilConfig) -> Result<String, CliError> {
    let format = config.debug.dump_format;
    let mut out = String::new();
    if config.debug.show_tokens {
        out.push_str(&match (format, &output.dumps.tokens) {
            (DumpFormat::Text, Some(text)) => text.clone(),
            _ => serialize(&output.tokens, format)?,
        });
    }
    if config.debug.show_ast {
        out.push_str(&match (format, &output.dumps.ast) {
            (DumpFormat::Text, Some(text)) => text.clone(),
            _ => serialize(&output.ast, format)?,
        });
    }
    if let Some(trace) = &output.dumps.parse {
        out.push_str(trace);
    }
    Ok(out)
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn run_single(
    path: &Path,
    config: &SigilConfig,
    registry: &MacroRegistry,
) -> Result<bool, CliError> {
    let source = read(path)?;
    let options = config.compile_options(&document_name(path));
    let output = compile(&source, &options, Some(registry), None)?;
    print!("{}", dumps(&output, config)?);
    print!("{}", output.output);
    report(&output.diagnostics);
    Ok(!output.has_errors())
}

fn run_project(
    paths: &[PathBuf],
    config: &SigilConfig,
    registry: MacroRegistry,
) -> Result<bool, CliError> {
    let mut project = Project::new(Arc::new(registry), MemoryStore::new())
        .with_index_document(config.project.index.clone());
    for path in paths {
        project.add_document(document_name(path), read(path)?);
    }
    let output = project.compile(&config.compile_options(""))?;

    let out_dir = PathBuf::from(&config.output.out_dir);
    std::fs::create_dir_all(&out_dir).map_err(|source| CliError::Io {
        path: out_dir.clone(),
        source,
    })?;
    for document in &output.documents {
        print!("{}", dumps(&document.output, config)?);
        let target = out_dir.join(format!("{}.{}", document.name, config.output.extension));
        std::fs::write(&target, &document.output.output).map_err(|source| CliError::Io {
            path: target.clone(),
            source,
        })?;
        tracing::info!(document = %document.name, path = %target.display(), "wrote document");
        report(&document.output.diagnostics);
    }
    report(&output.diagnostics);
    Ok(!output.has_errors())
}

fn run(matches: &ArgMatches) -> Result<bool, CliError> {
    let config = load_config(matches)?;
    let paths: Vec<PathBuf> = matches
        .get_many::<String>("paths")
        .into_iter()
        .flatten()
        .map(PathBuf::from)
        .collect();
    let registry = MacroRegistry::with_defaults();

    if paths.len() == 1 && matches.get_one::<String>("out-dir").is_none() {
        run_single(&paths[0], &config, &registry)
    } else {
        run_project(&paths, &config, registry)
    }
}

fn main() {
    let matches = command().get_matches();
    init_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
