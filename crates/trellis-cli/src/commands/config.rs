//! Config command for managing CLI configuration

use clap::{Args, Subcommand};

use crate::config::Config;
use crate::Cli;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a config value
    Get {
        /// Config key, e.g. `timeout_ms` or `graph.show_tags`
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
    /// Initialize default config file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs, cli: &Cli) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => run_get(cli, key),
        ConfigCommands::Set { key, value } => run_set(cli, key, value),
        ConfigCommands::List => run_list(cli),
        ConfigCommands::Path => run_path(cli),
        ConfigCommands::Init { force } => run_init(cli, *force),
    }
}

fn run_get(cli: &Cli, key: &str) -> anyhow::Result<()> {
    let config = Config::load(&cli.config_path())?;
    match config.get(key) {
        Some(value) => println!("{}", value),
        None => {
            eprintln!("Unknown config key: {}", key);
            eprintln!("Available keys: {}", Config::keys().join(", "));
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_set(cli: &Cli, key: &str, value: &str) -> anyhow::Result<()> {
    let path = cli.config_path();
    let mut config = Config::load(&path)?;
    config.set(key, value)?;
    config.save(&path)?;
    println!("Set {} = {}", key, value);
    Ok(())
}

fn run_list(cli: &Cli) -> anyhow::Result<()> {
    let path = cli.config_path();
    let config = Config::load(&path)?;
    println!("Config file: {}", path.display());
    println!();
    for key in Config::keys() {
        let value = config.get(&key).unwrap_or_else(|| "(not set)".to_string());
        println!("{} = {}", key, value);
    }
    Ok(())
}

fn run_path(cli: &Cli) -> anyhow::Result<()> {
    println!("{}", cli.config_path().display());
    Ok(())
}

fn run_init(cli: &Cli, force: bool) -> anyhow::Result<()> {
    let path = cli.config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    Config::default().save(&path)?;
    println!("Created config file at {}", path.display());
    Ok(())
}
