use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dome::ShellOrientation;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tools::{
    ToolError, flick_script, layout_rows, load_catalog, load_config, load_script, radius_report,
    simulate, transform_report, validate,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and simulate a dome gallery")]
struct Args {
    /// Catalog JSON file (default: built-in catalog)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Gallery config JSON file (default: built-in tuning)
    #[arg(long, global = true, env = "DOME_CONFIG")]
    config: Option<PathBuf>,

    /// Print compact JSON instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every slot with its grid coordinate and media
    Layout {
        /// Override the configured segment count
        #[arg(long)]
        segments: Option<usize>,
    },

    /// Print slot and shell transforms for an orientation and viewport
    Transforms {
        #[arg(long, default_value_t = 1920.0)]
        width: f64,
        #[arg(long, default_value_t = 1080.0)]
        height: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        pitch: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        yaw: f64,
    },

    /// Compute the sphere radius for a container size
    Radius {
        #[arg(allow_hyphen_values = true)]
        width: f64,
        #[arg(allow_hyphen_values = true)]
        height: f64,
    },

    /// Check a catalog and config and summarize them
    Validate,

    /// Run a gesture script (or a single flick) through the engine
    Simulate {
        /// Script JSON file: an array of steps
        #[arg(long, conflicts_with_all = ["drag", "velocity"])]
        script: Option<PathBuf>,

        /// Flick drag as DX,DY in px
        #[arg(long, value_parser = parse_pair, default_value = "100,0", allow_hyphen_values = true)]
        drag: [f64; 2],

        /// Flick release velocity as VX,VY in px/ms
        #[arg(long, value_parser = parse_pair, default_value = "0.02,0", allow_hyphen_values = true)]
        velocity: [f64; 2],
    },
}

fn parse_pair(s: &str) -> Result<[f64; 2], String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = a.trim().parse::<f64>().map_err(|e| format!("{a:?}: {e}"))?;
    let y = b.trim().parse::<f64>().map_err(|e| format!("{b:?}: {e}"))?;
    Ok([x, y])
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), ToolError> {
    let args = Args::parse();
    let catalog = load_catalog(args.catalog.as_deref())?;
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Layout { segments } => {
            let s = segments.unwrap_or(config.segment_count);
            print_json(&layout_rows(&catalog, s), args.compact)
        }
        Command::Transforms {
            width,
            height,
            pitch,
            yaw,
        } => {
            let orientation = ShellOrientation::new(pitch, yaw);
            let report = transform_report(catalog, config, (width, height), orientation)?;
            print_json(&report, args.compact)
        }
        Command::Radius { width, height } => {
            print_json(&radius_report(width, height, &config), args.compact)
        }
        Command::Validate => {
            let report = validate(&catalog, &config)?;
            info!(
                "catalog ok: {} items, {} slots",
                report.items, report.slots
            );
            print_json(&report, args.compact)
        }
        Command::Simulate {
            script,
            drag,
            velocity,
        } => {
            let steps = match script {
                Some(path) => load_script(&path)?,
                None => flick_script(drag, velocity),
            };
            let report = simulate(catalog, config, &steps)?;
            print_json(&report, args.compact)
        }
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), ToolError> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}")?;
    Ok(())
}
