//! `tinyerr`: renders uncaught-exception records and shows the last rendered trace.

use std::{
    fs,
    io::{self, Read as _},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use tinyerr::{Config, ConfigError, Engine, MissingBoundary, RawException, TraceStore};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive, e.g. `TINYERR_LOG=debug`.
const LOG_ENV: &str = "TINYERR_LOG";

/// Concise, human-readable rendering of uncaught Python exceptions.
#[derive(Debug, Parser)]
#[command(name = "tinyerr")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    render: RenderArgs,

    /// Enable diagnostic logging on stderr (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render an exception record (JSON) the way the hook would, then exit with status 1.
    Render {
        /// Path to the JSON record, or `-` to read it from stdin.
        record: String,
    },
    /// Print the last rendered trace with every frame.
    Last,
}

/// Options shared by every command.
#[derive(Debug, Args)]
struct RenderArgs {
    /// Show only the innermost N frames of each error (0 shows all).
    #[arg(long, value_name = "N", default_value_t = 0, global = true)]
    limit: usize,

    /// Keep frames whose statement is a bare `raise`.
    #[arg(long, global = true)]
    keep_raise_frames: bool,

    /// Print the trace in red.
    #[arg(long, global = true)]
    color: bool,

    /// Template of frame location lines.
    #[arg(long, value_name = "TEMPLATE", default_value = tinyerr::DEFAULT_FRAME_TEMPLATE, global = true)]
    format: String,

    /// Indentation of code blocks under each location line.
    #[arg(long, value_name = "SPACES", default_value_t = tinyerr::DEFAULT_CODE_INDENT, global = true)]
    indent: usize,

    /// Hide every frame up to and including the first frame in this file.
    #[arg(long, value_name = "FILE", global = true)]
    boundary: Option<PathBuf>,

    /// Keep all frames when the boundary file is not in the stack, instead of hiding them.
    #[arg(long, global = true)]
    show_all_if_boundary_missing: bool,

    /// Where the last trace is persisted.
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,
}

impl RenderArgs {
    fn config(&self) -> Result<Config, ConfigError> {
        let missing = if self.show_all_if_boundary_missing {
            MissingBoundary::ShowAll
        } else {
            MissingBoundary::HideAll
        };
        let mut config = Config::default()
            .frame_template(&self.format)?
            .code_indent(self.indent)
            .color(self.color)
            .traceback_limit(self.limit)
            .suppress_raise(!self.keep_raise_frames)
            .missing_boundary(missing);
        if let Some(boundary) = &self.boundary {
            config = config.boundary(boundary);
        }
        Ok(config)
    }

    fn store(&self) -> TraceStore {
        self.store.as_ref().map_or_else(TraceStore::default, TraceStore::new)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.render.config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let engine = Engine::new(config).with_store(cli.render.store());

    match cli.command {
        Command::Render { record } => {
            let raw = match read_record(&record) {
                Ok(raw) => raw,
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            };
            let _engine = tinyerr::activate_engine(engine);
            tinyerr::excepthook(&raw);
            // an uncaught exception terminates the script with status 1
            ExitCode::FAILURE
        }
        Command::Last => {
            println!("{}", engine.last_trace());
            ExitCode::SUCCESS
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_record(source: &str) -> Result<RawException, String> {
    let json = if source == "-" {
        let mut json = String::new();
        io::stdin()
            .read_to_string(&mut json)
            .map_err(|err| format!("reading stdin: {err}"))?;
        json
    } else {
        read_file(source)?
    };
    RawException::from_json(&json).map_err(|err| format!("invalid exception record {source}: {err}"))
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Err(format!("{file_path} is not a file")),
        Err(err) => return Err(format!("reading {file_path}: {err}")),
    }
    fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}"))
}
