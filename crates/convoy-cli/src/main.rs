mod cmd;
mod output;
mod root;
mod session;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cmd::deploy::DeployArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "convoy",
    about = "Reconcile a declared container fleet against ECS",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root holding gtd/ or configs/ (default: auto-detect)
    #[arg(long, global = true, env = "CONVOY_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// AWS CLI profile (overrides aws_profile in ~/.convoy.yaml)
    #[arg(long, global = true, env = "CONVOY_AWS_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Environment and service selection shared by every fleet command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Environment, i.e. the fleet file gtd/<env>.yaml
    #[arg(short = 'e', long = "env", env = "CONVOY_ENV")]
    pub env: Option<String>,

    /// Services to act on, comma separated (default: all)
    #[arg(short = 's', long = "service", value_delimiter = ',')]
    pub services: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy services: register new task definitions and update services
    Deploy(DeployArgs),

    /// Show the running revision and image of each service
    Status {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Create CloudFront invalidations for the selected services
    Invalidate {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List CloudFront invalidations for the selected services
    #[command(alias = "list-invalidation")]
    ListInvalidations {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Inspect the fleet configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Deploy(_) | Commands::Invalidate { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let profile = cli.profile.as_deref();

    let result = match cli.command {
        Commands::Deploy(args) => cmd::deploy::run(&root, args, profile, cli.json),
        Commands::Status { target } => cmd::status::run(&root, &target, profile, cli.json),
        Commands::Invalidate { target } => {
            cmd::invalidate::create(&root, &target, profile, cli.json)
        }
        Commands::ListInvalidations { target } => {
            cmd::invalidate::list(&root, &target, profile, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
