//! Resolve command

use std::sync::Arc;

use clap::Args;
use serde_json::json;
use trellis_editor::{LinkResolver, Resolution};

use crate::output::{to_json, OutputFormat};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct ResolveArgs {
    /// Link title, as written between `[[` and `]]`
    pub title: String,

    /// Create the note when no target exists
    #[arg(long)]
    pub create: bool,
}

pub async fn run(args: &ResolveArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let resolver = LinkResolver::new(Arc::clone(&ctx.store)).with_timeout(ctx.config.timeout());

    let resolution = if args.create {
        let note = resolver.open_or_create(&args.title).await?;
        Resolution::Open {
            id: note.id,
            title: note.title,
        }
    } else {
        resolver.resolve(&args.title).await
    };

    if resolution.is_degraded() && !cli.quiet {
        eprintln!("Warning: note server unreachable, the note may already exist");
    }

    match cli.output_format() {
        OutputFormat::Json => {
            let out = json!({
                "resolution": resolution,
                "route": resolution.route(),
            });
            println!("{}", to_json(&out)?);
        }
        OutputFormat::Table => match &resolution {
            Resolution::Open { id, title } => {
                println!("{}", resolution.route());
                if !cli.quiet {
                    eprintln!("Opens note {} ({})", id, title);
                }
            }
            Resolution::Create { .. } => println!("{}", resolution.route()),
        },
    }

    Ok(())
}
