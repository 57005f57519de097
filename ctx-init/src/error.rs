use std::io;

/// A command that could not be started at all.
#[derive(Debug, thiserror::Error)]
#[error("failed to launch {command}: {source}")]
pub struct LaunchError {
    pub command: String,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("no main command defined")]
    NoMainCommand,

    #[error("secret resolution failed: {0}")]
    Secret(#[from] secret_store::SecretError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

pub type InitResult<T> = Result<T, InitError>;
