//! Complete command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use trellis_editor::{AutocompleteProvider, Completion};

use crate::output::{to_json, OutputFormat, Table};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct CompleteArgs {
    /// Markdown file, or `-` for stdin
    pub file: PathBuf,

    /// Cursor byte offset (default: end of the document)
    #[arg(short, long)]
    pub cursor: Option<usize>,

    /// Complete even when nothing is typed after `[[`
    #[arg(long)]
    pub explicit: bool,
}

pub async fn run(args: &CompleteArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let text = super::read_input(&args.file)?;
    let cursor = args.cursor.unwrap_or(text.len());
    if cursor > text.len() {
        anyhow::bail!("Cursor {} is past the end of the document ({} bytes)", cursor, text.len());
    }

    let provider =
        AutocompleteProvider::new(Arc::clone(&ctx.store)).with_timeout(ctx.config.timeout());
    let completion = provider.complete(&text, cursor, args.explicit).await;

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&completion)?),
        OutputFormat::Table => match &completion {
            Completion::Ready(list) if !list.options.is_empty() => {
                let mut table = Table::new(&["LABEL", "DETAIL", "INSERT"]);
                for option in &list.options {
                    table.row(vec![
                        option.label.clone(),
                        option.detail.clone(),
                        option.insert.clone(),
                    ]);
                }
                println!("{}", table.render());
                if !cli.quiet {
                    eprintln!("Replaces bytes {}..{}", list.from, list.to);
                }
            }
            Completion::Ready(_) => println!("No matching notes"),
            Completion::Inactive | Completion::Stale => {
                if !cli.quiet {
                    println!("Cursor is not inside an open link");
                }
            }
        },
    }

    Ok(())
}
