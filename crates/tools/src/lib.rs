//! Offline inspection of a dome gallery: layouts, transforms and scripted
//! gesture runs, all without a browser.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use catalog::{Catalog, CatalogError, MediaItem};
use dome::{
    ConfigError, FrameOutcome, GalleryConfig, GalleryEngine, GalleryEvent, HitTarget, Layout,
    ShellOrientation, SlotId, ViewportRadius,
};
use foundation::math::Vec2;
use runtime::{Event, ManualScheduler, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Frame cap for `settle` steps, well above any valid inertia ceiling.
const SETTLE_FRAME_LIMIT: u32 = 100_000;

#[derive(Debug)]
pub enum ToolError {
    Catalog(CatalogError),
    Config(ConfigError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Catalog(err) => write!(f, "{err}"),
            ToolError::Config(err) => write!(f, "{err}"),
            ToolError::Io(err) => write!(f, "I/O error: {err}"),
            ToolError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Catalog(err) => Some(err),
            ToolError::Config(err) => Some(err),
            ToolError::Io(err) => Some(err),
            ToolError::Json(err) => Some(err),
        }
    }
}

impl From<CatalogError> for ToolError {
    fn from(err: CatalogError) -> Self {
        ToolError::Catalog(err)
    }
}

impl From<ConfigError> for ToolError {
    fn from(err: ConfigError) -> Self {
        ToolError::Config(err)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Io(err)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Json(err)
    }
}

/// The catalog at `path`, or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog, ToolError> {
    match path {
        Some(p) => {
            debug!("loading catalog from {}", p.display());
            Ok(Catalog::load(p)?)
        }
        None => Ok(Catalog::builtin()),
    }
}

/// The config at `path`, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<GalleryConfig, ToolError> {
    match path {
        Some(p) => {
            debug!("loading config from {}", p.display());
            Ok(GalleryConfig::load(p)?)
        }
        None => Ok(GalleryConfig::default()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRow {
    pub slot: SlotId,
    pub column: i32,
    pub row: i32,
    pub catalog_index: Option<usize>,
    pub label: String,
    pub image: String,
}

pub fn layout_rows(catalog: &Catalog, segment_count: usize) -> Vec<LayoutRow> {
    Layout::build(catalog, segment_count)
        .items()
        .iter()
        .map(|p| LayoutRow {
            slot: p.slot,
            column: p.coord.column,
            row: p.coord.row,
            catalog_index: p.catalog_index,
            label: p.media.label.clone(),
            image: p.media.image.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadiusReport {
    pub width: f64,
    pub height: f64,
    pub radius_px: f64,
    pub perspective_px: f64,
    pub cell_edge_px: f64,
    pub css: String,
}

pub fn radius_report(width: f64, height: f64, config: &GalleryConfig) -> RadiusReport {
    let r = ViewportRadius::from_size(width, height, &config.radius);
    RadiusReport {
        width,
        height,
        radius_px: r.px(),
        perspective_px: r.perspective_px(),
        cell_edge_px: r.cell_edge_px(config.segment_count),
        css: r.css(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotTransform {
    pub slot: SlotId,
    pub css: String,
    /// Screen offset of the slot centre, if it faces the viewer.
    pub screen: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformReport {
    pub radius: RadiusReport,
    pub shell: String,
    pub hover: String,
    pub slots: Vec<SlotTransform>,
}

pub fn transform_report(
    catalog: Catalog,
    config: GalleryConfig,
    viewport: (f64, f64),
    orientation: ShellOrientation,
) -> Result<TransformReport, ToolError> {
    let radius = radius_report(viewport.0, viewport.1, &config);
    let engine = GalleryEngine::new(catalog, config)?;
    let r = ViewportRadius::from_px(radius.radius_px);
    let shell = dome::ShellTransform::new(&orientation, r);
    let projection = engine.projection();
    let slots = engine
        .layout()
        .items()
        .iter()
        .filter_map(|p| {
            let css = engine.item_transform_css(p.slot)?;
            let screen = projection
                .project_slot(p.slot, &orientation, r)
                .map(|v| [v.x, v.y]);
            Some(SlotTransform {
                slot: p.slot,
                css,
                screen,
            })
        })
        .collect();
    Ok(TransformReport {
        radius,
        shell: shell.css(),
        hover: projection.hover_css(),
        slots,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub catalog_name: Option<String>,
    pub items: usize,
    pub empty_images: usize,
    pub content_hash: String,
    pub slots: usize,
    pub config: GalleryConfig,
}

pub fn validate(catalog: &Catalog, config: &GalleryConfig) -> Result<ValidationReport, ToolError> {
    config.validate()?;
    Ok(ValidationReport {
        catalog_name: catalog.name.clone(),
        items: catalog.len(),
        empty_images: catalog.items().iter().filter(|i| i.image.is_empty()).count(),
        content_hash: catalog.content_hash(),
        slots: config.segment_count * dome::ROWS_PER_COLUMN,
        config: config.clone(),
    })
}

/// One step of a scripted gesture run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Down {
        at: [f64; 2],
    },
    Move {
        at: [f64; 2],
    },
    Up {
        at: [f64; 2],
        #[serde(default)]
        velocity: [f64; 2],
        /// Slot the host found under the pointer.
        #[serde(default)]
        slot: Option<u32>,
        /// Offset from the viewport centre, used when `slot` is absent.
        #[serde(default)]
        screen: Option<[f64; 2]>,
    },
    Resize {
        width: f64,
        height: f64,
    },
    /// Delivers up to `count` frames.
    Frames {
        count: u32,
    },
    /// Delivers frames until nothing is pending.
    Settle,
}

pub fn parse_script(payload: &str) -> Result<Vec<ScriptStep>, ToolError> {
    Ok(serde_json::from_str(payload)?)
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>, ToolError> {
    parse_script(&fs::read_to_string(path)?)
}

/// A drag by `(dx, dy)` from the origin released at `velocity`, then settled.
pub fn flick_script(drag: [f64; 2], velocity: [f64; 2]) -> Vec<ScriptStep> {
    vec![
        ScriptStep::Down { at: [0.0, 0.0] },
        ScriptStep::Move { at: drag },
        ScriptStep::Up {
            at: drag,
            velocity,
            slot: None,
            screen: None,
        },
        ScriptStep::Settle,
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub frames_delivered: u64,
    pub orientation: ShellOrientation,
    pub normalized_yaw_deg: f64,
    pub radius_px: f64,
    pub selected: Option<Arc<MediaItem>>,
    pub events: Vec<Event<GalleryEvent>>,
    pub metrics: MetricsSnapshot,
}

pub fn simulate(
    catalog: Catalog,
    config: GalleryConfig,
    steps: &[ScriptStep],
) -> Result<SimulationReport, ToolError> {
    let mut engine = GalleryEngine::new(catalog, config)?;
    let mut sched = ManualScheduler::new();
    let mut events = Vec::new();
    let mut frames_delivered = 0u64;

    for step in steps {
        match step {
            ScriptStep::Down { at } => engine.pointer_down(vec2(*at), &mut sched),
            ScriptStep::Move { at } => {
                engine.pointer_move(vec2(*at));
            }
            ScriptStep::Up {
                at,
                velocity,
                slot,
                screen,
            } => {
                let target = match (slot, screen) {
                    (Some(s), _) => HitTarget::Slot(SlotId(*s)),
                    (None, Some(offset)) => HitTarget::Screen(vec2(*offset)),
                    (None, None) => HitTarget::Nothing,
                };
                let outcome = engine.pointer_up(vec2(*at), vec2(*velocity), target, &mut sched);
                debug!("release: {outcome:?}");
            }
            ScriptStep::Resize { width, height } => {
                engine.resize(*width, *height);
            }
            ScriptStep::Frames { count } => {
                frames_delivered += run_frames(&mut engine, &mut sched, *count);
            }
            ScriptStep::Settle => {
                frames_delivered += run_frames(&mut engine, &mut sched, SETTLE_FRAME_LIMIT);
            }
        }
        events.extend(engine.drain_events());
    }

    let orientation = *engine.orientation();
    info!(
        "simulation done: {frames_delivered} frames, pitch={} yaw={}",
        orientation.pitch_deg(),
        orientation.normalized_yaw_deg()
    );
    Ok(SimulationReport {
        frames_delivered,
        orientation,
        normalized_yaw_deg: orientation.normalized_yaw_deg(),
        radius_px: engine.radius().px(),
        selected: engine.selected().map(|p| Arc::clone(&p.media)),
        events,
        metrics: engine.metrics().snapshot(),
    })
}

fn run_frames(engine: &mut GalleryEngine, sched: &mut ManualScheduler, limit: u32) -> u64 {
    let mut delivered = 0u64;
    for _ in 0..limit {
        if !sched.has_pending() {
            break;
        }
        let (_, due) = sched.advance();
        for ticket in due {
            if engine.animation_frame(ticket, sched) != FrameOutcome::Stale {
                delivered += 1;
            }
        }
    }
    delivered
}

fn vec2(v: [f64; 2]) -> Vec2 {
    Vec2::new(v[0], v[1])
}
