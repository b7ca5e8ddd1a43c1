use crate::config::ResolverConfig;
use crate::context::JobContext;
use crate::environment::ClusterEnvironment;
use crate::error::{RendezvousError, Result};
use crate::resolver::{self, RendezvousInfo};

pub const WORLD_SIZE: &str = "WORLD_SIZE";
pub const RANK: &str = "RANK";
pub const LOCAL_RANK: &str = "LOCAL_RANK";
pub const NODE_RANK: &str = "NODE_RANK";

/// Single-node environment driven by torchrun-style variables.
///
/// Missing variables fall back to a single-process job on loopback. Nothing
/// external owns the ranks here, so the setters take effect.
#[derive(Debug, Clone)]
pub struct LocalEnvironment {
    ctx: JobContext,
    config: ResolverConfig,
    world_size: Option<usize>,
    global_rank: Option<usize>,
}

impl LocalEnvironment {
    pub fn new(ctx: JobContext, config: ResolverConfig) -> Self {
        Self {
            ctx,
            config,
            world_size: None,
            global_rank: None,
        }
    }

    fn read_or(&self, name: &str, default: usize) -> Result<usize> {
        if self.ctx.get_optional(name).is_some() {
            resolver::read_count(&self.ctx, name)
        } else {
            Ok(default)
        }
    }
}

impl ClusterEnvironment for LocalEnvironment {
    fn name(&self) -> &'static str {
        "local"
    }

    fn creates_children(&self) -> bool {
        false
    }

    fn context(&self) -> &JobContext {
        &self.ctx
    }

    fn master_address(&self) -> String {
        self.ctx
            .get_optional(&self.config.vars.master_addr)
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_address.clone())
    }

    fn master_port(&self) -> Result<u16> {
        let name = &self.config.vars.master_port;
        match self.ctx.get_optional(name) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| RendezvousError::malformed_port(name, raw)),
            None => Ok(self.config.default_port),
        }
    }

    fn world_size(&self) -> Result<usize> {
        match self.world_size {
            Some(size) => Ok(size),
            None => self.read_or(WORLD_SIZE, 1),
        }
    }

    fn set_world_size(&mut self, size: usize) {
        tracing::debug!(world_size = size, "World size set");
        self.world_size = Some(size);
    }

    fn global_rank(&self) -> Result<usize> {
        match self.global_rank {
            Some(rank) => Ok(rank),
            None => self.read_or(RANK, 0),
        }
    }

    fn set_global_rank(&mut self, rank: usize) {
        tracing::debug!(global_rank = rank, "Global rank set");
        self.global_rank = Some(rank);
    }

    fn local_rank(&self) -> Result<usize> {
        self.read_or(LOCAL_RANK, 0)
    }

    fn node_rank(&self) -> Result<usize> {
        self.read_or(NODE_RANK, 0)
    }

    fn rendezvous(&mut self) -> Result<RendezvousInfo> {
        let address = self.master_address();
        let port = self.master_port()?;
        let vars = &self.config.vars;

        self.ctx.publish(vars.master_addr.as_str(), address.as_str());
        self.ctx.publish(vars.master_port.as_str(), port.to_string());

        tracing::debug!(master_addr = %address, master_port = port, "Rendezvous resolved");

        Ok(RendezvousInfo { address, port })
    }
}
