//! Trellis CLI - Link scanning, resolution and graph exploration

use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;
mod store;

use commands::{backlinks, complete, graph, layout, resolve, scan};
use config::{config_file_path, Config};
use output::OutputFormat;
use store::Backend;
use trellis_rpc::{RpcServer, SessionOptions};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about = "Bidirectional links and knowledge graph for your notes")]
pub struct Cli {
    /// Note server API root (overrides the config file)
    #[arg(long, env = "TRELLIS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Config file
    #[arg(long, env = "TRELLIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Use a built-in demo corpus instead of a note server
    #[arg(long, global = true)]
    pub demo: bool,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print a completion script for SHELL and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the link and tag spans in a file
    Scan(scan::ScanArgs),
    /// Resolve a link title to a note
    Resolve(resolve::ResolveArgs),
    /// List the notes linking to a note
    Backlinks(backlinks::BacklinksArgs),
    /// Suggest link targets at a cursor position
    Complete(complete::CompleteArgs),
    /// Show the filtered note graph
    Graph(graph::GraphArgs),
    /// Lay out the graph and print node positions
    Layout(layout::LayoutArgs),
    /// Start the JSON-RPC bridge on stdio
    Serve,
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

/// Application context with the note store
pub struct AppContext {
    pub config: Config,
    pub store: Arc<Backend>,
}

impl AppContext {
    pub fn new(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = Config::load(&cli.config_path())?;
        if let Some(url) = &cli.base_url {
            config.base_url = url.clone();
        }

        let store = if cli.demo {
            tracing::debug!("Using demo corpus");
            Backend::demo()?
        } else {
            tracing::debug!("Using note server at {}", config.base_url);
            Backend::http(&config.base_url, config.timeout())?
        };

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeout: self.config.timeout(),
            prune_to_viewport: self.config.prune_to_viewport,
            settings: self.config.graph.clone(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity; stdout is reserved for output
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting trellis CLI");

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Commands that need no store
    match command {
        Commands::Config(args) => return commands::config::run(args, &cli),
        Commands::Scan(args) => return scan::run(args, &cli),
        _ => {}
    }

    let ctx = AppContext::new(&cli)?;

    match command {
        Commands::Resolve(args) => resolve::run(args, &cli, &ctx).await?,
        Commands::Backlinks(args) => backlinks::run(args, &cli, &ctx).await?,
        Commands::Complete(args) => complete::run(args, &cli, &ctx).await?,
        Commands::Graph(args) => graph::run(args, &cli, &ctx).await?,
        Commands::Layout(args) => layout::run(args, &cli, &ctx).await?,
        Commands::Serve => {
            let mut server = RpcServer::with_options(Arc::clone(&ctx.store), ctx.session_options());
            server.run_stdio().await?;
        }
        Commands::Config(_) | Commands::Scan(_) => {}
    }

    Ok(())
}
