mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{ConfigOverrides, LocalsSource};
use output::{OutputFormat, print_error};

/// relua - run Lua scripts whose imports resolve asynchronously
#[derive(Parser)]
#[command(name = "relua")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging and execution statistics
  #[arg(short, long, global = true)]
  verbose: bool,

  /// JSON file with executor settings
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Deepest nesting level for imported scripts
  #[arg(long, global = true)]
  max_depth: Option<usize>,

  /// Retries allowed after a script's first attempt
  #[arg(long, global = true)]
  max_retry: Option<usize>,

  /// Directory name holding platform modules
  #[arg(long, global = true)]
  modules_dir: Option<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute a script and print its exports
  Exec {
    /// Path to the script
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Evaluate a template script and render it with locals
  Render {
    /// Path to the template script
    file: PathBuf,

    /// JSON file with template locals
    #[arg(long, conflicts_with = "locals_json")]
    locals: Option<PathBuf>,

    /// Template locals as inline JSON
    #[arg(long)]
    locals_json: Option<String>,

    /// Write the rendered text to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let overrides = ConfigOverrides {
    file: cli.config,
    max_depth: cli.max_depth,
    max_retry: cli.max_retry,
    modules_dir: cli.modules_dir,
  };

  let result = overrides.load().and_then(|config| match cli.command {
    Commands::Exec { file, format } => cmd::cmd_exec(&file, format, config, cli.verbose),
    Commands::Render {
      file,
      locals,
      locals_json,
      output,
    } => {
      let locals = match (locals, locals_json) {
        (Some(path), _) => LocalsSource::File(path),
        (None, Some(json)) => LocalsSource::Inline(json),
        (None, None) => LocalsSource::Empty,
      };
      cmd::cmd_render(&file, locals, output.as_deref(), config, cli.verbose)
    }
  });

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
