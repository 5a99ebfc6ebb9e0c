//! Layout command

use clap::Args;
use trellis_core::limits::{clamp, CENTER_FORCE, LINK_DISTANCE, REPEL_FORCE};
use trellis_layout::controller::DEFAULT_FIT_PADDING;

use super::graph::{load_session, FilterArgs};
use crate::output::{to_json, OutputFormat, Table};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct LayoutArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Viewport width in pixels
    #[arg(long, default_value = "800")]
    pub width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value = "600")]
    pub height: f64,

    /// Padding kept around the fitted graph
    #[arg(long, default_value_t = DEFAULT_FIT_PADDING)]
    pub padding: f64,

    /// Pull towards the centre (0 to 2)
    #[arg(long)]
    pub center: Option<f64>,

    /// Node repulsion (-1000 to 0)
    #[arg(long, allow_hyphen_values = true)]
    pub repel: Option<f64>,

    /// Preferred link length (10 to 200)
    #[arg(long)]
    pub distance: Option<f64>,
}

pub async fn run(args: &LayoutArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    if args.width <= 0.0 || args.height <= 0.0 {
        anyhow::bail!("Viewport must have a positive size");
    }

    let mut settings = args.filter.apply(&ctx.config.graph);
    if let Some(center) = args.center {
        settings.center_force = clamp(center, &CENTER_FORCE);
    }
    if let Some(repel) = args.repel {
        settings.repel_force = clamp(repel, &REPEL_FORCE);
    }
    if let Some(distance) = args.distance {
        settings.link_distance = clamp(distance, &LINK_DISTANCE);
    }

    let (mut session, stats) = load_session(ctx, settings).await?;
    let frame = session.layout(args.width, args.height, Some(args.padding))?;
    tracing::info!("Layout settled after {} ticks ({})", frame.ticks, stats);

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&frame)?),
        OutputFormat::Table => {
            let mut table = Table::new(&["ID", "X", "Y", "SCREEN X", "SCREEN Y"]);
            for pos in &frame.positions {
                let (sx, sy) = frame.camera.to_screen(pos.x as f64, pos.y as f64);
                table.row(vec![
                    pos.id.to_string(),
                    format!("{:.1}", pos.x),
                    format!("{:.1}", pos.y),
                    format!("{:.1}", sx),
                    format!("{:.1}", sy),
                ]);
            }
            println!("{}", table.render());
            println!();
            println!(
                "Camera: x={:.1} y={:.1} zoom={:.3}",
                frame.camera.x, frame.camera.y, frame.camera.k
            );
        }
    }

    Ok(())
}
