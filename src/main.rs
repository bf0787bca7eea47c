//! Safe Coordinator CLI Application
//!
//! A command-line interface for proposing, approving and executing Safe
//! multisig transactions.

use clap::{Parser, Subcommand};
use safe_coordinator::api::{create_router, ApiState};
use safe_coordinator::cli::{self, DEVNET_CHAIN_ID};
use safe_coordinator::config::CoordinatorConfig;
use safe_coordinator::core::{Address, TxHash};
use safe_coordinator::multisig::MultisigCoordinator;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "safe-coordinator")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Off-chain signature coordination for Safe multisig wallets", long_about = None)]
struct Cli {
    /// Data directory for proposals and chain configuration
    #[arg(short, long, default_value = ".safe_coordinator")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signing key
    Keygen,

    /// Local devnet Safe management
    Devnet {
        #[command(subcommand)]
        action: DevnetCommands,
    },

    /// Chain registry operations
    Chain {
        #[command(subcommand)]
        action: ChainCommands,
    },

    /// Create a proposal
    Propose {
        /// Chain identifier from the chain registry
        #[arg(short, long)]
        chain: String,

        /// Free-text annotation
        #[arg(short, long, default_value = "")]
        remark: String,

        #[command(subcommand)]
        action: ProposeCommands,
    },

    /// Approve a proposal
    Approve {
        #[arg(short, long)]
        chain: String,

        /// Proposal hash
        #[arg(short = 'p', long)]
        proposal_hash: TxHash,

        /// Signer's private key (hex)
        #[arg(short = 'k', long)]
        private_key: String,

        /// Approve via on-chain approveHash instead of an off-chain signature
        #[arg(long)]
        onchain: bool,
    },

    /// Execute a proposal that has enough signatures
    Execute {
        #[arg(short, long)]
        chain: String,

        #[arg(short = 'p', long)]
        proposal_hash: TxHash,

        /// Executor's private key (hex)
        #[arg(short = 'k', long)]
        private_key: String,
    },

    /// List proposals
    List {
        /// Only proposals for this chain
        #[arg(short, long)]
        chain: Option<String>,

        /// Only proposals that have not been executed
        #[arg(long)]
        pending: bool,
    },

    /// Show a proposal
    Show {
        #[arg(short = 'p', long)]
        proposal_hash: TxHash,
    },

    /// Show owners, threshold and nonce of a Safe
    Owners {
        #[arg(short, long)]
        chain: String,
    },

    /// Start the REST API server for one chain
    Serve {
        #[arg(short, long)]
        chain: String,

        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum DevnetCommands {
    /// Create a file-backed Safe and register it as a chain
    Setup {
        #[arg(short, long)]
        chain: String,

        /// Owner addresses (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<Address>,

        #[arg(short, long)]
        threshold: u64,

        #[arg(long, default_value_t = DEVNET_CHAIN_ID)]
        chain_id: u64,
    },
}

#[derive(Subcommand)]
enum ChainCommands {
    /// Register a chain
    Add {
        #[arg(short, long)]
        chain: String,

        /// RPC endpoint (local://<name> for a devnet Safe)
        #[arg(short, long)]
        rpc: String,

        /// Safe address
        #[arg(short, long)]
        safe: Address,

        #[arg(long)]
        chain_id: Option<u64>,
    },

    /// Register the proxy admin and proxy of an upgradeable contract
    SetProxy {
        #[arg(short, long)]
        chain: String,

        /// Logical contract name
        #[arg(long)]
        contract: String,

        #[arg(long)]
        admin: Address,

        #[arg(long)]
        proxy: Address,
    },

    /// Show a chain record
    Show {
        #[arg(short, long)]
        chain: String,
    },
}

#[derive(Subcommand)]
enum ProposeCommands {
    /// addOwnerWithThreshold
    AddOwner {
        #[arg(short, long)]
        owner: Address,

        #[arg(short, long)]
        threshold: u64,
    },

    /// removeOwner
    RemoveOwner {
        #[arg(short, long)]
        owner: Address,

        #[arg(short, long)]
        threshold: u64,
    },

    /// swapOwner
    SwapOwner {
        #[arg(long)]
        old_owner: Address,

        #[arg(long)]
        new_owner: Address,
    },

    /// changeThreshold
    Threshold {
        #[arg(short, long)]
        threshold: u64,
    },

    /// Upgrade a proxied contract
    Upgrade {
        /// Logical contract name
        #[arg(long)]
        contract: String,

        /// New implementation address
        #[arg(short, long)]
        implementation: Address,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = CoordinatorConfig::new(cli.data_dir.clone());

    match cli.command {
        Commands::Keygen => {
            cli::cmd_keygen()?;
        }

        Commands::Devnet { action } => match action {
            DevnetCommands::Setup {
                chain,
                owners,
                threshold,
                chain_id,
            } => {
                cli::cmd_devnet_setup(&config, &chain, owners, threshold, chain_id)?;
            }
        },

        Commands::Chain { action } => match action {
            ChainCommands::Add {
                chain,
                rpc,
                safe,
                chain_id,
            } => {
                cli::cmd_chain_add(&config, &chain, &rpc, safe, chain_id)?;
            }
            ChainCommands::SetProxy {
                chain,
                contract,
                admin,
                proxy,
            } => {
                cli::cmd_chain_set_proxy(&config, &chain, &contract, admin, proxy)?;
            }
            ChainCommands::Show { chain } => {
                cli::cmd_chain_show(&config, &chain)?;
            }
        },

        Commands::Propose {
            chain,
            remark,
            action,
        } => match action {
            ProposeCommands::AddOwner { owner, threshold } => {
                cli::cmd_propose_add_owner(&config, &chain, owner, threshold, &remark)?;
            }
            ProposeCommands::RemoveOwner { owner, threshold } => {
                cli::cmd_propose_remove_owner(&config, &chain, owner, threshold, &remark)?;
            }
            ProposeCommands::SwapOwner {
                old_owner,
                new_owner,
            } => {
                cli::cmd_propose_swap_owner(&config, &chain, old_owner, new_owner, &remark)?;
            }
            ProposeCommands::Threshold { threshold } => {
                cli::cmd_propose_threshold(&config, &chain, threshold, &remark)?;
            }
            ProposeCommands::Upgrade {
                contract,
                implementation,
            } => {
                cli::cmd_propose_upgrade(&config, &chain, &contract, implementation, &remark)?;
            }
        },

        Commands::Approve {
            chain,
            proposal_hash,
            private_key,
            onchain,
        } => {
            cli::cmd_approve(&config, &chain, &proposal_hash, &private_key, onchain)?;
        }

        Commands::Execute {
            chain,
            proposal_hash,
            private_key,
        } => {
            cli::cmd_execute(&config, &chain, &proposal_hash, &private_key)?;
        }

        Commands::List { chain, pending } => {
            cli::cmd_list(&config, chain.as_deref(), pending)?;
        }

        Commands::Show { proposal_hash } => {
            cli::cmd_show(&config, &proposal_hash)?;
        }

        Commands::Owners { chain } => {
            cli::cmd_owners(&config, &chain)?;
        }

        Commands::Serve { chain, port } => {
            run_server(&config, &chain, port)?;
        }
    }

    Ok(())
}

fn run_server(
    config: &CoordinatorConfig,
    chain: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let coordinator = MultisigCoordinator::open(chain, config)?;
    let status = coordinator.safe_status()?;
    let state = ApiState::new(coordinator);
    let app = create_router(state);

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let addr = format!("0.0.0.0:{}", port);
        println!("🚀 Starting REST API server on http://{}", addr);
        println!("   ⛓️  Chain: {}", chain);
        println!("   📍 Safe: {}", status.address);
        println!(
            "   👥 {} owner(s), threshold {}",
            status.owners.len(),
            status.threshold
        );
        println!("\n📡 API Endpoints:");
        println!("   GET  /health");
        println!("   GET  /api/safe");
        println!("   GET  /api/proposals[?pending=true]");
        println!("   GET  /api/proposals/{{hash}}");
        println!("   POST /api/proposals/owners/add|remove|swap");
        println!("   POST /api/proposals/threshold");
        println!("   POST /api/proposals/upgrade");
        println!("   POST /api/proposals/{{hash}}/signatures");
        println!("   POST /api/proposals/{{hash}}/execute");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
