//! Cluster environments.
//!
//! A [`ClusterEnvironment`] answers the questions a launcher asks before it
//! can bootstrap peer discovery: where is the rendezvous endpoint, how many
//! processes take part, and which one is this. Each scheduler backend is a
//! separate implementation:
//!
//! - [`SlurmEnvironment`]: ranks and sizes are owned by SLURM and read-only
//! - [`LocalEnvironment`]: torchrun-style variables with single-process
//!   defaults; ranks may be assigned by the caller
//!
//! [`detect`] picks the backend from the captured [`JobContext`].

pub mod local;
pub mod slurm;

pub use local::LocalEnvironment;
pub use slurm::SlurmEnvironment;

use crate::config::ResolverConfig;
use crate::context::JobContext;
use crate::error::Result;
use crate::resolver::{JobIdentity, RendezvousInfo};

pub trait ClusterEnvironment: std::fmt::Debug + Send + Sync {
    /// Short backend name for logs and output
    fn name(&self) -> &'static str;

    /// Whether the scheduler already started one process per task, so the
    /// launcher must not spawn its own ranks.
    fn creates_children(&self) -> bool;

    fn context(&self) -> &JobContext;

    fn master_address(&self) -> String;

    fn master_port(&self) -> Result<u16>;

    fn world_size(&self) -> Result<usize>;

    fn set_world_size(&mut self, size: usize);

    fn global_rank(&self) -> Result<usize>;

    fn set_global_rank(&mut self, rank: usize);

    fn local_rank(&self) -> Result<usize>;

    fn node_rank(&self) -> Result<usize>;

    fn identity(&self) -> Result<JobIdentity> {
        JobIdentity {
            global_rank: self.global_rank()?,
            local_rank: self.local_rank()?,
            node_rank: self.node_rank()?,
            world_size: self.world_size()?,
        }
        .validate()
    }

    /// Resolve the rendezvous endpoint and publish it for child processes.
    fn rendezvous(&mut self) -> Result<RendezvousInfo>;
}

/// Pick the backend for a captured context: SLURM when its task count is
/// exported, local otherwise.
pub fn detect(ctx: JobContext, config: ResolverConfig) -> Box<dyn ClusterEnvironment> {
    let env: Box<dyn ClusterEnvironment> = if SlurmEnvironment::is_present(&ctx, &config) {
        Box::new(SlurmEnvironment::new(ctx, config))
    } else {
        Box::new(LocalEnvironment::new(ctx, config))
    };
    tracing::info!(environment = env.name(), "Cluster environment detected");
    env
}
