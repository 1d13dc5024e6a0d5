//! Command-line front end for the code generator: parses the Bot API
//! reference page, applies a config file, and writes the generated Rust
//! source plus (optionally) a diffable YAML dump of the parsed IR (§6).
//!
//! Fail-fast: any load, parse, config or emit error aborts the whole run
//! with a non-zero exit code and a log line on stderr (§7 "the generator is
//! fail-fast").

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tgbot_tl_gen::{Config, Outputs, generate};

/// Generates Rust source for the Telegram Bot API types and methods from a
/// parsed reference page.
#[derive(Parser)]
#[command(name = "tgbot-gen", version, about)]
struct Cli {
    /// Path to the HTML reference page to parse.
    #[arg(long = "input")]
    input: PathBuf,

    /// Path to the generator's YAML config file. Omit for an empty config.
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Package name stamped into the generated README, if `--readme` is given.
    #[arg(long = "pkg", default_value = "tgbot-types")]
    pkg: String,

    /// Writes `generated_types.rs` and `generated_methods.rs` into this
    /// directory, in the layout a `build.rs` would use. Takes priority over
    /// `--types-output` / `--methods-output` when given.
    #[arg(long = "tgb-output")]
    tgb_output: Option<PathBuf>,

    /// Destination file for the generated data types, when not using `--tgb-output`.
    #[arg(long = "types-output")]
    types_output: Option<PathBuf>,

    /// Destination file for the generated method request structs, when not using `--tgb-output`.
    #[arg(long = "methods-output")]
    methods_output: Option<PathBuf>,

    /// Writes the parsed IR as YAML to this path, for diffing between runs.
    #[arg(long = "spec-output")]
    spec_output: Option<PathBuf>,

    /// Writes a short generated README describing the parsed API surface.
    #[arg(long = "readme")]
    readme: Option<PathBuf>,

    /// Enables debug-level logging.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("reading {path}: {source}")]
    ReadInput { path: PathBuf, source: std::io::Error },
    #[error("parsing {path}: {source}")]
    Parse { path: PathBuf, source: tgbot_tl_parser::ParseError },
    #[error("{path} violates an IR invariant: {source}")]
    Invariant { path: PathBuf, source: tgbot_tl_parser::ir::InvariantError },
    #[error("loading config: {0}")]
    Config(#[from] tgbot_tl_gen::errors::ConfigError),
    #[error("generating bindings: {0}")]
    Emit(#[from] tgbot_tl_gen::errors::EmitError),
    #[error("creating output directory {path}: {source}")]
    CreateOutputDir { path: PathBuf, source: std::io::Error },
    #[error("opening {path} for writing: {source}")]
    OpenOutput { path: PathBuf, source: std::io::Error },
    #[error("serializing the parsed IR: {0}")]
    SerializeSpec(#[from] serde_yaml::Error),
    #[error("writing {path}: {source}")]
    WriteOutput { path: PathBuf, source: std::io::Error },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: single-threaded at this point, before any logger reads the environment.
        unsafe { std::env::set_var("RUST_LOG", format!("tgbot_gen_cli={level}")) };
    }
    env_logger::init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("tgbot-gen: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let html = fs::read_to_string(&cli.input)
        .map_err(|source| CliError::ReadInput { path: cli.input.clone(), source })?;
    log::debug!("read reference page from {}", cli.input.display());

    let api = tgbot_tl_parser::parse_document(&html)
        .map_err(|source| CliError::Parse { path: cli.input.clone(), source })?;
    api.check_invariants().map_err(|source| CliError::Invariant { path: cli.input.clone(), source })?;
    log::info!("parsed {} types, {} methods", api.types.len(), api.methods.len());

    let config = match &cli.config {
        Some(path) => Config::load(path, &api)?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.tgb_output {
        fs::create_dir_all(dir).map_err(|source| CliError::CreateOutputDir { path: dir.clone(), source })?;
        let mut outputs =
            Outputs::from_dir(dir).map_err(|source| CliError::CreateOutputDir { path: dir.clone(), source })?;
        generate(&api, &config, &mut outputs)?;
        log::info!("wrote generated sources to {}", dir.display());
    } else if cli.types_output.is_some() || cli.methods_output.is_some() {
        let mut types_buf = Vec::new();
        let mut methods_buf = Vec::new();
        let mut outputs = Outputs { types: &mut types_buf, methods: &mut methods_buf };
        generate(&api, &config, &mut outputs)?;

        if let Some(path) = &cli.types_output {
            write_file(path, &types_buf)?;
        }
        if let Some(path) = &cli.methods_output {
            write_file(path, &methods_buf)?;
        }
    }

    if let Some(path) = &cli.spec_output {
        let yaml = serde_yaml::to_string(&api)?;
        write_file(path, yaml.as_bytes())?;
        log::info!("wrote IR dump to {}", path.display());
    }

    if let Some(path) = &cli.readme {
        let readme = render_readme(&cli.pkg, &api);
        write_file(path, readme.as_bytes())?;
    }

    Ok(())
}

fn write_file(path: &std::path::Path, contents: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| CliError::CreateOutputDir { path: parent.to_path_buf(), source })?;
        }
    }
    fs::write(path, contents).map_err(|source| CliError::WriteOutput { path: path.to_path_buf(), source })
}

fn render_readme(pkg: &str, api: &tgbot_tl_parser::ir::Api) -> String {
    format!(
        "# {pkg}\n\nGenerated from the Telegram Bot API reference page.\n\n\
         - {} documented types\n- {} documented methods\n",
        api.types.len(),
        api.methods.len(),
    )
}
