//! Graph command

use std::sync::Arc;

use clap::Args;
use serde_json::json;
use trellis_core::limits::validate_search;
use trellis_core::{EdgeKind, Graph, GraphId, GraphSettings, GraphStats};
use trellis_rpc::Session;

use crate::output::{to_json, OutputFormat, Table};
use crate::store::Backend;
use crate::{AppContext, Cli};

/// Filter flags shared by `graph` and `layout`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep only nodes whose title contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Hide nodes without any shown edge
    #[arg(long)]
    pub hide_orphans: bool,

    /// Include tag nodes and their edges
    #[arg(long)]
    pub tags: bool,
}

impl FilterArgs {
    /// Layer the flags over the configured settings
    pub fn apply(&self, base: &GraphSettings) -> GraphSettings {
        let mut settings = base.clone();
        if let Some(search) = &self.search {
            settings.search_query = search.clone();
        }
        if self.hide_orphans {
            settings.show_orphans = false;
        }
        if self.tags {
            settings.show_tags = true;
        }
        settings
    }
}

#[derive(Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Only print the node and link counts
    #[arg(long)]
    pub stats: bool,
}

/// Fetch the graph and apply `settings`
pub async fn load_session(
    ctx: &AppContext,
    settings: GraphSettings,
) -> anyhow::Result<(Session<Backend>, GraphStats)> {
    validate_search(&settings.search_query)?;
    let mut options = ctx.session_options();
    options.settings = settings;

    let mut session = Session::with_options(Arc::clone(&ctx.store), options);
    let stats = session.refresh_graph().await?;
    Ok((session, stats))
}

pub async fn run(args: &GraphArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let settings = args.filter.apply(&ctx.config.graph);
    let (mut session, stats) = load_session(ctx, settings).await?;
    let frame = session.frame(None)?;

    match cli.output_format() {
        OutputFormat::Json if args.stats => println!("{}", to_json(&stats)?),
        OutputFormat::Json => {
            let out = json!({
                "nodes": frame.graph.nodes,
                "edges": frame.graph.edges,
                "stats": frame.stats,
            });
            println!("{}", to_json(&out)?);
        }
        OutputFormat::Table => {
            if !args.stats {
                print_tables(&frame.graph);
                println!();
            }
            println!("{}", stats);
        }
    }

    Ok(())
}

fn print_tables(graph: &Graph) {
    let title_of = |id: &GraphId| {
        graph
            .node(id)
            .map(|n| n.title.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut table = Table::new(&["ID", "TITLE", "GROUP", "DEGREE"]);
    for node in &graph.nodes {
        table.row(vec![
            node.id.to_string(),
            node.title.clone(),
            node.group.as_str().to_string(),
            node.degree.to_string(),
        ]);
    }
    println!("{}", table.render());

    if graph.edges.is_empty() {
        return;
    }
    println!();
    let mut table = Table::new(&["SOURCE", "TARGET", "KIND"]);
    for edge in &graph.edges {
        let kind = match edge.kind {
            EdgeKind::Link => "link",
            EdgeKind::TagAssoc => "tag",
        };
        table.row(vec![title_of(&edge.source), title_of(&edge.target), kind.to_string()]);
    }
    println!("{}", table.render());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_layer_over_config() {
        let base = GraphSettings::default().with_search("road");
        let args = FilterArgs {
            search: None,
            hide_orphans: true,
            tags: true,
        };

        let settings = args.apply(&base);
        assert_eq!(settings.search_query, "road");
        assert!(!settings.show_orphans);
        assert!(settings.show_tags);
    }

    #[test]
    fn test_filter_args_default_keeps_config() {
        let base = GraphSettings::default().with_orphans(false).with_tags(true);
        assert_eq!(FilterArgs::default().apply(&base), base);
    }
}
