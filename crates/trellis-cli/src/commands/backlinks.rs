//! Backlinks command

use std::sync::Arc;

use clap::Args;
use trellis_editor::LinkResolver;

use crate::output::{to_json, OutputFormat, Table};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct BacklinksArgs {
    /// Title of the linked-to note
    pub title: String,
}

pub async fn run(args: &BacklinksArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let resolver = LinkResolver::new(Arc::clone(&ctx.store)).with_timeout(ctx.config.timeout());
    let backlinks = resolver.backlinks(&args.title).await?;

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&backlinks)?),
        OutputFormat::Table => {
            let Some(target) = &backlinks.target else {
                println!("No note matches {:?}", args.title);
                return Ok(());
            };
            if backlinks.links.is_empty() {
                println!("Nothing links to {}", target.title);
                return Ok(());
            }

            let mut table = Table::new(&["ID", "TITLE", "CONTEXT"]);
            for link in &backlinks.links {
                table.row(vec![
                    link.id.to_string(),
                    link.title.clone(),
                    link.snippet.replace('\n', " "),
                ]);
            }
            println!("{}", table.render());
            if !cli.quiet {
                println!();
                println!("{} notes link to {}", backlinks.links.len(), target.title);
            }
        }
    }

    Ok(())
}
