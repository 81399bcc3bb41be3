use staterail_core::api::StateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("state definition error: {0}")]
    Definition(String),
    #[error("{0}")]
    Lookup(#[from] StateError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl CliError {
    // 0: success
    // 1: a navigation did not complete
    // 11: config error
    // 12: state definition / lookup error
    // 20: IO error
    // 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Definition(_) | Self::Lookup(_) => 12,
            Self::Command(_) | Self::Io(_) => 20,
            Self::Anyhow(_) => 50,
        }
    }
}
