/// Names of the scheduler variables the resolver reads and publishes.
///
/// Defaults to the variables SLURM exports to every task of a job step.
/// `master_addr` and `master_port` are the conventional unprefixed names
/// used by torch.distributed-style launchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarNames {
    /// Compressed node list, e.g. `node[05-07,09]`
    pub node_list: String,
    /// Job id, seeds the derived port
    pub job_id: String,
    /// Total number of tasks (world size)
    pub ntasks: String,
    /// Global rank of this task
    pub procid: String,
    /// Rank of this task on its node
    pub localid: String,
    /// Index of this node within the allocation
    pub nodeid: String,
    /// Published rendezvous address
    pub master_addr: String,
    /// Explicit port override, and where the derived port is published
    pub master_port: String,
}

impl Default for VarNames {
    fn default() -> Self {
        Self {
            node_list: "SLURM_NODELIST".to_string(),
            job_id: "SLURM_JOB_ID".to_string(),
            ntasks: "SLURM_NTASKS".to_string(),
            procid: "SLURM_PROCID".to_string(),
            localid: "SLURM_LOCALID".to_string(),
            nodeid: "SLURM_NODEID".to_string(),
            master_addr: "MASTER_ADDR".to_string(),
            master_port: "MASTER_PORT".to_string(),
        }
    }
}

impl VarNames {
    /// Scheduler-neutral names (`NODE_LIST`, `JOB_ID`, `NTASKS`, ...).
    pub fn unprefixed() -> Self {
        Self {
            node_list: "NODE_LIST".to_string(),
            job_id: "JOB_ID".to_string(),
            ntasks: "NTASKS".to_string(),
            procid: "PROCID".to_string(),
            localid: "LOCALID".to_string(),
            nodeid: "NODEID".to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub vars: VarNames,
    /// Address used when no node list is exported
    pub default_address: String,
    /// Port used when neither an override nor a job id is exported
    pub default_port: u16,
    /// Added to the job id seed so derived ports stay clear of well-known ports
    pub port_offset: u16,
    /// How many trailing job id characters seed the port
    pub port_seed_digits: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            vars: VarNames::default(),
            default_address: "127.0.0.1".to_string(),
            default_port: 12910,
            port_offset: 15000,
            port_seed_digits: 4,
        }
    }
}

impl ResolverConfig {
    pub fn new(vars: VarNames) -> Self {
        Self {
            vars,
            ..Default::default()
        }
    }

    pub fn with_default_address(mut self, address: impl Into<String>) -> Self {
        self.default_address = address.into();
        self
    }

    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }
}
