use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
///
/// Tool failures are not errors here: they arrive as `Error:` text and exit
/// with code 3.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] quotewire_core::ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Logging(_) => 2,
        }
    }
}
