//! lsgit CLI - Directory listings annotated with git status
//!
//! Every git working tree directly below the listed directory is shown with
//! its branch, remote and fast-forward state.

mod commands;

use clap::{Parser, Subcommand};
use lsgit_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ProbeArgs, ShowArgs};

/// lsgit: directory listings with git status
#[derive(Parser, Debug)]
#[command(name = "lsgit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Shell that runs the status probe (overrides config and env)
    #[arg(long, global = true, env = "LSGIT_SHELL")]
    shell: Option<String>,

    /// Path to git executable (overrides config and env)
    #[arg(long, global = true, env = "LSGIT_GIT_PATH")]
    git_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// List a directory with git status annotations
    #[command(visible_alias = "ls")]
    Show(ShowArgs),

    /// Print the raw status records for a directory
    Probe(ProbeArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.shell.clone(), cli.git_path.clone())?;

    if cli.verbose {
        tracing::info!(
            shell = %config.probe.shell,
            git_path = %config.probe.git_path,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("lsgit {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Show(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Probe(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Config) => {
            println!("lsgit Configuration");
            println!("===================");
            println!();
            println!("Probe Settings:");
            println!("  shell: {}", config.probe.shell);
            println!("  git_path: {}", config.probe.git_path);
            println!();
            println!("Annotation Settings:");
            println!("  separator: {:?}", config.annotation.separator);
            println!("  trailer: {:?}", config.annotation.trailer);
            println!("  align: {}", config.annotation.align);
            println!("  owner: {}", config.annotation.owner);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            ShowArgs::default().execute(cli.verbose, &config).await?;
        }
    }

    Ok(())
}
