//! Logger bootstrap for the command-line shell.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Starts logging to stderr.
///
/// `RUST_LOG`, when set, overrides `spec`. The returned handle must be kept
/// alive for as long as log output is wanted.
pub fn init_logging(spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(spec)?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
}
