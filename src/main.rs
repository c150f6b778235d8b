//! Binary entry point for the easypbt CLI.
//!
//! ## Usage
//!
//! ```bash
//! # List the testing patterns
//! easypbt patterns
//!
//! # Generate a roundtrip test for encode/decode into codec_test.py
//! easypbt generate codec.py --pattern roundtrip --function encode --function decode
//!
//! # Preview a bespoke skeleton without touching the test file
//! easypbt generate mymath.py --pattern SOME_THINGS_NEVER_CHANGE --function abs_ --dry-run
//!
//! # Add an @example decorator snippet for a test
//! easypbt example mymath_test.py --test TestSomeThingsNeverChangeAbs_.test_some_things_never_change_abs_
//! ```
//!
//! Every command prints one JSON response on stdout. Logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use easypbt::cli::{
    run_example, run_functions, run_generate, run_patterns, run_snippet, GenerateOptions,
};
use easypbt::config::{CliOverrides, ResolvedConfig};
use easypbt::error::{OutputErrorCode, PbtError};
use easypbt::generate::SynthesisConfig;
use easypbt::generator::HypothesisWriter;
use easypbt::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Property-based test scaffolding for Python functions.
///
/// All output is JSON, for consumption by editor extensions.
#[derive(Parser, Debug)]
#[command(name = "easypbt", version, about = "Property-based test scaffolding for Python")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Format of log lines on stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Suffix inserted before `.py` in the test file name (default: `_test`).
    #[arg(long, global = true)]
    test_suffix: Option<String>,

    /// Baseline generator program (default: `hypothesis` on PATH).
    #[arg(long, global = true)]
    generator: Option<PathBuf>,

    /// Seconds to wait for the baseline generator (default: 60).
    #[arg(long, global = true)]
    generator_timeout: Option<u64>,
}

impl GlobalArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            test_suffix: self.test_suffix.clone(),
            generator: self.generator.clone(),
            generator_timeout_secs: self.generator_timeout,
        }
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the testing patterns.
    Patterns,

    /// List the functions and class methods defined in a file.
    Functions {
        /// Python source file.
        file: PathBuf,
    },

    /// Generate a test skeleton and merge it into the test file.
    Generate {
        /// Python source file containing the functions.
        file: PathBuf,

        /// Pattern: numeric id, identifier (ROUNDTRIP) or kebab-case name.
        #[arg(long)]
        pattern: String,

        /// Function under test (`f` or `Class.method`); give a second one
        /// for two-function patterns.
        #[arg(long = "function", required = true)]
        functions: Vec<String>,

        /// Compute the result without writing the test file.
        #[arg(long)]
        dry_run: bool,

        /// Append the skeleton body to the test file as well.
        #[arg(long)]
        append: bool,
    },

    /// Render a generated skeleton as an editor snippet.
    Snippet {
        /// File containing the generated skeleton.
        #[arg(long)]
        pbt_file: PathBuf,

        /// Function under test, used to name custom strategies.
        #[arg(long)]
        sut: String,

        /// Argument that needs a custom composite strategy (repeatable).
        #[arg(long = "custom")]
        custom: Vec<String>,
    },

    /// Build an `@example` decorator snippet for a test.
    Example {
        /// Test file.
        file: PathBuf,

        /// Test function (`test_f` or `TestClass.test_f`).
        #[arg(long)]
        test: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), PbtError> {
    let resolved = ResolvedConfig::resolve(&cli.global.overrides());
    tracing::debug!(?resolved, "resolved configuration");
    let config = SynthesisConfig::from_resolved(&resolved);

    let json = match cli.command {
        Command::Patterns => run_patterns()?,
        Command::Functions { file } => run_functions(&file)?,
        Command::Generate {
            file,
            pattern,
            functions,
            dry_run,
            append,
        } => {
            let baseline = HypothesisWriter::new(
                resolved.generator.value.clone(),
                resolved.generator_timeout.value,
            );
            let options = GenerateOptions {
                source_path: file,
                pattern,
                functions,
                dry_run,
                append,
            };
            run_generate(&options, &config, &baseline)?
        }
        Command::Snippet {
            pbt_file,
            sut,
            custom,
        } => run_snippet(&pbt_file, &sut, &custom, &config)?,
        Command::Example { file, test } => run_example(&file, &test, &config)?,
    };

    println!("{}", json);
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
