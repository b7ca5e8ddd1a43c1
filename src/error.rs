use thiserror::Error;

#[derive(Error, Debug)]
pub enum RendezvousError {
    #[error("Required scheduler variable {name} is not set")]
    MissingVariable { name: String },

    #[error("Scheduler variable {name} is not a valid rank or size: {value:?}")]
    MalformedIdentity { name: String, value: String },

    #[error("Scheduler variable {name} does not yield a valid port: {value:?}")]
    MalformedPort { name: String, value: String },

    #[error("Global rank {global_rank} is outside world size {world_size}")]
    InvalidIdentity { global_rank: usize, world_size: usize },

    #[error("Setting {field} is not supported by this cluster environment")]
    UnsupportedMutation { field: &'static str },

    #[error("Failed to launch child process: {0}")]
    Spawn(#[from] std::io::Error),
}

impl RendezvousError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    pub fn malformed_identity(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedIdentity {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn malformed_port(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedPort {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RendezvousError>;
