//! Hand-off from resolution to the training process.
//!
//! A [`Bootstrap`] is the `{address, port, identity}` triple a training
//! process needs to join the job. [`Launcher`] runs a child process with that
//! triple exported in the conventional torch.distributed variables.

use std::collections::BTreeMap;
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::environment::local::{LOCAL_RANK, NODE_RANK, RANK, WORLD_SIZE};
use crate::environment::ClusterEnvironment;
use crate::error::Result;
use crate::resolver::{JobIdentity, RendezvousInfo};

#[derive(Debug, Clone, Serialize)]
pub struct Bootstrap {
    pub environment: &'static str,
    pub rendezvous: RendezvousInfo,
    pub identity: JobIdentity,
    /// Values the environment published while resolving
    #[serde(skip)]
    pub published: BTreeMap<String, String>,
}

impl Bootstrap {
    /// Resolve the rendezvous endpoint and identity of this process.
    ///
    /// Identity errors are returned before anything is published for
    /// children to inherit.
    pub fn resolve(env: &mut dyn ClusterEnvironment) -> Result<Self> {
        let identity = env.identity()?;
        let rendezvous = env.rendezvous()?;

        tracing::info!(
            environment = env.name(),
            rendezvous = %rendezvous,
            global_rank = identity.global_rank,
            world_size = identity.world_size,
            "Bootstrap resolved"
        );

        Ok(Self {
            environment: env.name(),
            rendezvous,
            identity,
            published: env.context().derived().clone(),
        })
    }

    /// Variables a child training process needs, on top of the inherited
    /// environment.
    pub fn child_env(&self) -> BTreeMap<String, String> {
        let mut vars = self.published.clone();
        vars.insert("MASTER_ADDR".to_string(), self.rendezvous.address.clone());
        vars.insert("MASTER_PORT".to_string(), self.rendezvous.port.to_string());
        vars.insert(WORLD_SIZE.to_string(), self.identity.world_size.to_string());
        vars.insert(RANK.to_string(), self.identity.global_rank.to_string());
        vars.insert(LOCAL_RANK.to_string(), self.identity.local_rank.to_string());
        vars.insert(NODE_RANK.to_string(), self.identity.node_rank.to_string());
        vars
    }
}

/// Runs one child process with the bootstrap environment.
#[derive(Debug, Clone)]
pub struct Launcher {
    bootstrap: Bootstrap,
    shutdown: CancellationToken,
}

impl Launcher {
    pub fn new(bootstrap: Bootstrap, shutdown: CancellationToken) -> Self {
        Self {
            bootstrap,
            shutdown,
        }
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    /// Run `program` to completion and return its exit code.
    ///
    /// Stdio is inherited. If the shutdown token fires first the child is
    /// killed. A child that died from a signal reports exit code 1.
    pub async fn run(&self, program: &str, args: &[String]) -> Result<i32> {
        tracing::info!(
            program,
            rank = self.bootstrap.identity.global_rank,
            "Launching child process"
        );

        let mut child = Command::new(program)
            .args(args)
            .envs(self.bootstrap.child_env())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = self.shutdown.cancelled() => {
                tracing::warn!(program, "Shutdown requested, killing child process");
                child.kill().await?;
                child.wait().await?
            }
        };

        let exit_code = status.code().unwrap_or(1);
        if status.success() {
            tracing::info!(program, "Child process completed");
        } else {
            tracing::error!(program, exit_code, "Child process failed");
        }
        Ok(exit_code)
    }
}
