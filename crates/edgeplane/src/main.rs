mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edgeplane")]
#[command(about = "Declarative CDN configuration: compile rule trees, inspect managed state", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rule document commands
    #[command(subcommand)]
    Rules(RulesCommands),

    /// Observed-state commands
    #[command(subcommand)]
    State(StateCommands),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum RulesCommands {
    /// Compile a KDL rule document into the rule tree JSON
    Compile {
        /// Rule document (.kdl)
        file: PathBuf,

        /// Allow several entries per behavior/criterion block
        #[arg(long)]
        lenient: bool,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a rule document without writing output
    Validate {
        /// Rule document (.kdl)
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List managed resources and their lifecycle status
    List {
        /// State directory (defaults to state.dir from the config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries command output, logs go to stderr
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    if matches!(command, Commands::Version) {
        println!("edgeplane {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config, config_path) = edgeplane_config::EdgeplaneConfig::load_or_default()?;

    match command {
        Commands::Rules(RulesCommands::Compile {
            file,
            lenient,
            output,
        }) => commands::rules::compile(&config, &file, lenient, output.as_deref()),
        Commands::Rules(RulesCommands::Validate { file }) => {
            commands::rules::validate(&config, &file)
        }
        Commands::State(StateCommands::List { dir }) => {
            commands::state::list(&config, dir.as_deref()).await
        }
        Commands::Config(ConfigCommands::Show) => {
            commands::config::show(&config, config_path.as_deref())
        }
        Commands::Version => Ok(()),
    }
}
