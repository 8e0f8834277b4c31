mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use linode_plugin_cloud::Outcome;
use std::path::PathBuf;

/// Exit code asking the orchestrator to re-invoke the operation later
const EXIT_RETRY: i32 = 75;

#[derive(Parser)]
#[command(name = "linode-plugin")]
#[command(about = "Create, start, stop and delete Linode instances for an orchestrator", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Invocation context supplied by the orchestrator
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Linode API token
    #[arg(long, env = "LINODE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Linode API base URL
    #[arg(long, env = "LINODE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory node instance state is kept in
    #[arg(long, env = "LINODE_PLUGIN_STATE_DIR", default_value = ".", global = true)]
    pub state_dir: PathBuf,

    /// Node instance the operation runs for
    #[arg(
        long,
        env = "LINODE_PLUGIN_NODE_INSTANCE_ID",
        default_value = "linode",
        global = true
    )]
    pub node_instance_id: String,

    #[arg(long, env = "LINODE_PLUGIN_NODE_ID", default_value = "", global = true)]
    pub node_id: String,

    #[arg(long, env = "LINODE_PLUGIN_DEPLOYMENT_ID", default_value = "", global = true)]
    pub deployment_id: String,

    #[arg(long, env = "LINODE_PLUGIN_BLUEPRINT_ID", default_value = "", global = true)]
    pub blueprint_id: String,

    /// How many times the orchestrator has retried this operation
    #[arg(long, env = "LINODE_PLUGIN_RETRY_NUMBER", default_value_t = 0, global = true)]
    pub retry_number: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a linode, or adopt an existing one
    Create(commands::SpecArgs),
    /// Boot a linode; creates one first when none is known
    Start {
        /// Linode id (defaults to the recorded one)
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        spec: commands::SpecArgs,
    },
    /// Shut a linode down
    Stop {
        /// Linode id (defaults to the recorded one)
        #[arg(long)]
        id: Option<String>,
    },
    /// Destroy a linode
    Delete {
        /// Linode id (defaults to the recorded one)
        #[arg(long)]
        id: Option<String>,
    },
    /// List images available for new linodes
    Images,
    /// List regions accepting new linodes
    Regions,
    /// List instance types
    Types {
        /// Region the types are wanted for
        #[arg(long)]
        region: Option<String>,
    },
    /// Register an SSH public key on the account
    SshKey {
        /// Label for the key
        label: String,
        /// Public key file
        #[arg(long)]
        public_key_file: PathBuf,
    },
    /// Show the state recorded for the node instance
    Show,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let global = cli.global;
    let (operation, result) = match cli.command {
        Commands::Version => {
            println!("linode-plugin {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Commands::Images => return commands::catalog::images(&global).await,
        Commands::Regions => return commands::catalog::regions(&global).await,
        Commands::Types { region } => {
            return commands::catalog::types(&global, region.as_deref()).await;
        }
        Commands::SshKey {
            label,
            public_key_file,
        } => return commands::ssh_key::handle(&global, &label, &public_key_file).await,
        Commands::Show => return commands::show::handle(&global).await,
        Commands::Create(spec) => (
            "create",
            commands::lifecycle::create(&global, spec.into_spec()?).await,
        ),
        Commands::Start { id, spec } => (
            "start",
            commands::lifecycle::start(&global, utils::parse_id(id.as_deref())?, spec.into_spec()?)
                .await,
        ),
        Commands::Stop { id } => (
            "stop",
            commands::lifecycle::stop(&global, utils::parse_id(id.as_deref())?).await,
        ),
        Commands::Delete { id } => (
            "delete",
            commands::lifecycle::delete(&global, utils::parse_id(id.as_deref())?).await,
        ),
    };

    match result? {
        Outcome::Success => {
            println!();
            println!("{}", format!("✓ {} completed", operation).green().bold());
            Ok(())
        }
        Outcome::Retry { after, message } => {
            println!();
            println!("{}", format!("↻ {}", message).yellow());
            println!("retry_after={}", after.as_secs());
            std::process::exit(EXIT_RETRY);
        }
        Outcome::Fatal(e) => {
            eprintln!();
            eprintln!("{}", format!("✗ {} failed: {}", operation, e).red().bold());
            std::process::exit(1);
        }
    }
}
