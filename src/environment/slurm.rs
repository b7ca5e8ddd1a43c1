use crate::config::ResolverConfig;
use crate::context::JobContext;
use crate::environment::ClusterEnvironment;
use crate::error::{RendezvousError, Result};
use crate::resolver::{self, JobIdentity, RendezvousInfo};

/// Cluster environment for tasks started by `srun`/`sbatch`.
///
/// SLURM starts every task itself and owns the rank assignment, so the rank
/// and size setters are accepted and ignored.
#[derive(Debug, Clone)]
pub struct SlurmEnvironment {
    ctx: JobContext,
    config: ResolverConfig,
}

impl SlurmEnvironment {
    pub fn new(ctx: JobContext, config: ResolverConfig) -> Self {
        Self { ctx, config }
    }

    pub fn is_present(ctx: &JobContext, config: &ResolverConfig) -> bool {
        ctx.is_exported(&config.vars.ntasks)
    }

    fn ignore(field: &'static str) {
        let err = RendezvousError::UnsupportedMutation { field };
        tracing::debug!(error = %err, "Ignoring mutation of scheduler-owned value");
    }
}

impl ClusterEnvironment for SlurmEnvironment {
    fn name(&self) -> &'static str {
        "slurm"
    }

    fn creates_children(&self) -> bool {
        true
    }

    fn context(&self) -> &JobContext {
        &self.ctx
    }

    fn master_address(&self) -> String {
        resolver::resolve_address(&self.ctx, &self.config)
    }

    fn master_port(&self) -> Result<u16> {
        resolver::resolve_port(&self.ctx, &self.config)
    }

    fn world_size(&self) -> Result<usize> {
        resolver::read_count(&self.ctx, &self.config.vars.ntasks)
    }

    fn set_world_size(&mut self, _size: usize) {
        Self::ignore("world size");
    }

    fn global_rank(&self) -> Result<usize> {
        resolver::read_count(&self.ctx, &self.config.vars.procid)
    }

    fn set_global_rank(&mut self, _rank: usize) {
        Self::ignore("global rank");
    }

    fn local_rank(&self) -> Result<usize> {
        resolver::read_count(&self.ctx, &self.config.vars.localid)
    }

    fn node_rank(&self) -> Result<usize> {
        resolver::read_count(&self.ctx, &self.config.vars.nodeid)
    }

    fn identity(&self) -> Result<JobIdentity> {
        resolver::resolve_identity(&self.ctx, &self.config)
    }

    fn rendezvous(&mut self) -> Result<RendezvousInfo> {
        resolver::publish_rendezvous(&mut self.ctx, &self.config)
    }
}
