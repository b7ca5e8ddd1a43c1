use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use rendezvous_lite::config::{ResolverConfig, VarNames};
use rendezvous_lite::environment::{self, ClusterEnvironment, LocalEnvironment, SlurmEnvironment};
use rendezvous_lite::launcher::{Bootstrap, Launcher};
use rendezvous_lite::resolver::resolve_root_node_address;
use rendezvous_lite::shutdown::install_shutdown_handler;
use rendezvous_lite::JobContext;

#[derive(Parser, Debug)]
#[command(name = "rendezvous-lite")]
#[command(version)]
#[command(about = "Resolve rendezvous address, port and ranks for scheduler-launched jobs")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the rendezvous endpoint and identity of this process
    Resolve {
        #[command(flatten)]
        env: EnvArgs,

        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },

    /// Print the root node of a node-list expression (e.g. "node[05-07,09]")
    RootNode {
        expression: String,

        /// Output format
        #[arg(long, short = 'o', default_value = "table")]
        output: OutputFormat,
    },

    /// Run a command with MASTER_ADDR, MASTER_PORT and ranks exported
    Exec {
        #[command(flatten)]
        env: EnvArgs,

        /// Program to run
        program: String,

        /// Arguments passed to the program
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

// =============================================================================
// Environment Arguments (shared by resolve and exec)
// =============================================================================

#[derive(Parser, Debug)]
struct EnvArgs {
    /// Cluster environment backend
    #[arg(long, short = 'b', default_value = "auto", env = "RENDEZVOUS_BACKEND")]
    backend: Backend,

    /// Read NODE_LIST, JOB_ID, NTASKS, ... instead of the SLURM_* names
    #[arg(long)]
    unprefixed: bool,

    /// Port used when neither MASTER_PORT nor a job id is set
    #[arg(long, default_value = "12910")]
    default_port: u16,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Auto,
    Slurm,
    Local,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct RootNodeOutput<'a> {
    expression: &'a str,
    root_node: String,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn build_environment(args: &EnvArgs) -> Box<dyn ClusterEnvironment> {
    let vars = if args.unprefixed {
        VarNames::unprefixed()
    } else {
        VarNames::default()
    };
    let config = ResolverConfig::new(vars).with_default_port(args.default_port);
    let ctx = JobContext::from_env();

    match args.backend {
        Backend::Auto => environment::detect(ctx, config),
        Backend::Slurm => Box::new(SlurmEnvironment::new(ctx, config)),
        Backend::Local => Box::new(LocalEnvironment::new(ctx, config)),
    }
}

fn print_bootstrap(
    bootstrap: &Bootstrap,
    output: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(bootstrap)?);
        }
        OutputFormat::Table => {
            let identity = &bootstrap.identity;
            println!("Environment:  {}", bootstrap.environment);
            println!("Master Addr:  {}", bootstrap.rendezvous.address);
            println!("Master Port:  {}", bootstrap.rendezvous.port);
            println!("World Size:   {}", identity.world_size);
            println!("Global Rank:  {}", identity.global_rank);
            println!("Local Rank:   {}", identity.local_rank);
            println!("Node Rank:    {}", identity.node_rank);
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match args.command {
        Commands::Resolve { env, output } => {
            let mut cluster = build_environment(&env);
            let bootstrap = Bootstrap::resolve(&mut *cluster)?;
            print_bootstrap(&bootstrap, &output)?;
        }
        Commands::RootNode { expression, output } => {
            let root_node = resolve_root_node_address(&expression);
            match output {
                OutputFormat::Json => {
                    let out = RootNodeOutput {
                        expression: &expression,
                        root_node,
                    };
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Table => println!("{}", root_node),
            }
        }
        Commands::Exec { env, program, args } => {
            let mut cluster = build_environment(&env);
            let bootstrap = Bootstrap::resolve(&mut *cluster)?;
            let shutdown = install_shutdown_handler()?;

            let exit_code = Launcher::new(bootstrap, shutdown).run(&program, &args).await?;
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
