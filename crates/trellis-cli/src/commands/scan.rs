//! Scan command

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use trellis_editor::{Decorations, DocumentSnapshot, RegionKind, Viewport};

use crate::output::{to_json, OutputFormat, Table};
use crate::Cli;

#[derive(Args)]
pub struct ScanArgs {
    /// Markdown file, or `-` for stdin
    pub file: PathBuf,

    /// Only report spans intersecting this byte range (FROM:TO)
    #[arg(long, value_parser = parse_range)]
    pub range: Option<Viewport>,
}

fn parse_range(s: &str) -> Result<Viewport, String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got {}", s))?;
    let from: usize = from.trim().parse().map_err(|_| format!("bad offset: {}", from))?;
    let to: usize = to.trim().parse().map_err(|_| format!("bad offset: {}", to))?;
    if from > to {
        return Err(format!("range start {} is past its end {}", from, to));
    }
    Ok(Viewport::new(from, to))
}

/// One span as printed by `scan`
#[derive(Debug, Serialize)]
struct ScannedSpan {
    kind: RegionKind,
    from: usize,
    to: usize,
    text: String,
    /// Note title for links, tag name for tags
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
}

pub fn run(args: &ScanArgs, cli: &Cli) -> anyhow::Result<()> {
    let text = super::read_input(&args.file)?;
    let decorations = Decorations::compute(&DocumentSnapshot::new(text, 0), args.range);

    let mut spans: Vec<ScannedSpan> = decorations
        .links
        .iter()
        .map(|link| ScannedSpan {
            kind: RegionKind::Link,
            from: link.span.from,
            to: link.span.to,
            text: link.span.raw_text.clone(),
            target: link.title().to_string(),
            alias: link.alias().map(str::to_string),
        })
        .chain(decorations.tags.iter().map(|tag| ScannedSpan {
            kind: RegionKind::Tag,
            from: tag.span.from,
            to: tag.span.to,
            text: tag.span.raw_text.clone(),
            target: tag.name().to_string(),
            alias: None,
        }))
        .collect();
    spans.sort_by_key(|s| s.from);

    tracing::info!(
        "Scanned {}: {} links, {} tags",
        args.file.display(),
        decorations.links.len(),
        decorations.tags.len()
    );

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&spans)?),
        OutputFormat::Table => {
            if spans.is_empty() {
                if !cli.quiet {
                    println!("No links or tags found");
                }
                return Ok(());
            }
            let mut table = Table::new(&["KIND", "FROM", "TO", "TEXT", "TARGET"]);
            for span in &spans {
                let kind = match span.kind {
                    RegionKind::Link => "link",
                    RegionKind::Tag => "tag",
                };
                table.row(vec![
                    kind.to_string(),
                    span.from.to_string(),
                    span.to.to_string(),
                    span.text.clone(),
                    span.target.clone(),
                ]);
            }
            println!("{}", table.render());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("3:10").unwrap(), Viewport::new(3, 10));
        assert!(parse_range("10:3").is_err());
        assert!(parse_range("10").is_err());
        assert!(parse_range("a:3").is_err());
    }
}
