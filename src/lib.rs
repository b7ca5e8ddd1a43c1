pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod launcher;
pub mod resolver;
pub mod shutdown;

pub use context::JobContext;
pub use environment::ClusterEnvironment;
pub use error::{RendezvousError, Result};
pub use resolver::{JobIdentity, RendezvousInfo};
