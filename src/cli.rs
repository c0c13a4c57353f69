//! Command-line plumbing shared by the binaries.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use env_logger::Env;

/// Exit status for usage errors, matching clap's own
pub const USAGE_EXIT_CODE: i32 = 2;

/// Command-line usage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),
    #[error("Invalid value for {argument}: expected {expected}")]
    InvalidArgumentType { argument: String, expected: String },
}

impl UsageError {
    /// Classify a clap parse error. Help and version requests and other
    /// errors map to `None`.
    pub fn from_clap(err: &clap::Error) -> Option<Self> {
        let argument = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(argument)) => argument.clone(),
            Some(ContextValue::Strings(arguments)) => arguments.join(", "),
            _ => "<unknown>".to_string(),
        };
        match err.kind() {
            ErrorKind::MissingRequiredArgument => Some(UsageError::MissingArgument(argument)),
            // Paths and names accept any text; only integers can fail to parse
            ErrorKind::ValueValidation | ErrorKind::InvalidValue => {
                Some(UsageError::InvalidArgumentType {
                    argument,
                    expected: "integer".to_string(),
                })
            }
            _ => None,
        }
    }
}

/// Default log filter for a `--verbose` level
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize logging; `RUST_LOG` wins over the verbosity level
pub fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level(verbose))).init();
}

/// Report a parse error and exit: usage errors print the message and the
/// usage line on stderr, anything else is left to clap.
pub fn exit_with_usage(err: clap::Error, command: &mut clap::Command) -> ! {
    match UsageError::from_clap(&err) {
        Some(usage) => {
            eprintln!("error: {}\n\n{}", usage, command.render_usage());
            std::process::exit(USAGE_EXIT_CODE)
        }
        None => err.exit(),
    }
}

/// Parse the process arguments, exiting with a usage message on failure
pub fn parse_args<T: clap::Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| exit_with_usage(err, &mut T::command()))
}
