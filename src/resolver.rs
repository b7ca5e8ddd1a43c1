//! Rendezvous address, port and identity resolution.
//!
//! Every function here is a pure function of a [`JobContext`]: all peers of a
//! job see the same node list and job id, so they independently arrive at the
//! same rendezvous endpoint without talking to each other.
//!
//! # Resolution rules
//!
//! - **Address**: first node of the node list, bracket ranges collapsed to
//!   their first member (`node[05-07,09]` -> `node05`), else `127.0.0.1`.
//! - **Port**: explicit `MASTER_PORT`, else the last four characters of the
//!   job id plus 15000, else 12910.
//! - **Identity**: world size and ranks read verbatim from the scheduler.

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::context::JobContext;
use crate::error::{RendezvousError, Result};

/// Endpoint every peer dials to join the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RendezvousInfo {
    pub address: String,
    pub port: u16,
}

impl RendezvousInfo {
    /// `tcp://host:port`, the form torch.distributed expects as init method.
    pub fn init_method(&self) -> String {
        format!("tcp://{}:{}", self.address, self.port)
    }
}

impl std::fmt::Display for RendezvousInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Position of this process within the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobIdentity {
    pub global_rank: usize,
    pub local_rank: usize,
    pub node_rank: usize,
    pub world_size: usize,
}

impl JobIdentity {
    /// Check `world_size > 0` and `global_rank < world_size`.
    pub fn validate(self) -> Result<Self> {
        if self.world_size == 0 || self.global_rank >= self.world_size {
            return Err(RendezvousError::InvalidIdentity {
                global_rank: self.global_rank,
                world_size: self.world_size,
            });
        }
        Ok(self)
    }

    pub fn is_root(&self) -> bool {
        self.global_rank == 0
    }
}

/// Collapse a node-list expression to the first node it names.
///
/// Only the first bracketed group is considered and anything after its
/// closing `]` is dropped. The result is the prefix followed by the digits of
/// the first listed number (or lower range bound).
pub fn resolve_root_node_address(raw: &str) -> String {
    let Some((prefix, rest)) = raw.split_once('[') else {
        return raw.to_string();
    };

    let range_body = rest.split(']').next().unwrap_or_default();
    let first = range_body.split(',').next().unwrap_or_default();
    let lower = first.split('-').next().unwrap_or_default();
    let digits: String = lower.chars().filter(|c| c.is_ascii_digit()).collect();

    format!("{prefix}{digits}")
}

pub fn resolve_address(ctx: &JobContext, config: &ResolverConfig) -> String {
    let root_node = ctx
        .get_optional(&config.vars.node_list)
        .and_then(|list| list.split_whitespace().next())
        .and_then(|first| first.split(',').next())
        .filter(|node| !node.is_empty());

    match root_node {
        Some(node) => resolve_root_node_address(node),
        None => config.default_address.clone(),
    }
}

pub fn resolve_port(ctx: &JobContext, config: &ResolverConfig) -> Result<u16> {
    let vars = &config.vars;

    if let Some(explicit) = ctx.get_optional(&vars.master_port) {
        return explicit
            .trim()
            .parse::<u16>()
            .map_err(|_| RendezvousError::malformed_port(&vars.master_port, explicit));
    }

    match ctx.get_optional(&vars.job_id).map(str::trim) {
        Some(job_id) if !job_id.is_empty() => {
            let skip = job_id
                .chars()
                .count()
                .saturating_sub(config.port_seed_digits);
            let seed: String = job_id.chars().skip(skip).collect();

            seed.parse::<u32>()
                .ok()
                .and_then(|seed| seed.checked_add(u32::from(config.port_offset)))
                .and_then(|port| u16::try_from(port).ok())
                .ok_or_else(|| RendezvousError::malformed_port(&vars.job_id, job_id))
        }
        _ => Ok(config.default_port),
    }
}

pub fn resolve_identity(ctx: &JobContext, config: &ResolverConfig) -> Result<JobIdentity> {
    let vars = &config.vars;
    JobIdentity {
        global_rank: read_count(ctx, &vars.procid)?,
        local_rank: read_count(ctx, &vars.localid)?,
        node_rank: read_count(ctx, &vars.nodeid)?,
        world_size: read_count(ctx, &vars.ntasks)?,
    }
    .validate()
}

/// Resolve the rendezvous endpoint and publish it into the context's derived
/// layer so that spawned children inherit the same address and port.
///
/// The port is only published when the scheduler did not export an explicit
/// one; the snapshot itself is never touched.
pub fn publish_rendezvous(ctx: &mut JobContext, config: &ResolverConfig) -> Result<RendezvousInfo> {
    let address = resolve_address(ctx, config);
    let port = resolve_port(ctx, config)?;
    let vars = &config.vars;

    ctx.publish(vars.master_addr.as_str(), address.as_str());
    if !ctx.is_exported(&vars.master_port) {
        ctx.publish(vars.master_port.as_str(), port.to_string());
    }

    tracing::debug!(master_addr = %address, master_port = port, "Rendezvous resolved");

    Ok(RendezvousInfo { address, port })
}

pub(crate) fn read_count(ctx: &JobContext, name: &str) -> Result<usize> {
    let raw = ctx.get_required(name)?;
    raw.trim()
        .parse::<usize>()
        .map_err(|_| RendezvousError::malformed_identity(name, raw))
}
