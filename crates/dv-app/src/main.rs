//! `datavis` - load a dataset, apply filters, build every view and project a
//! selection, printing the result as JSON

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};

use dv_core::{ViewKind, ViewSettings};
use dv_data::{CsvSource, DataSource, EngineConfig, JsonSource};
use dv_views::{ViewDataset, Viewport};

mod args;

#[derive(Parser)]
#[command(name = "datavis")]
#[command(version)]
#[command(about = "Coordinated-view data engine: dimensions, filters, view datasets and selections")]
struct Cli {
    /// Dataset file: a JSON array of flat objects, or CSV with a header row
    dataset: PathBuf,

    /// JSON file mapping each view to its role -> column settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filter as COL=MIN..MAX or COL=a,b (repeatable)
    #[arg(long = "filter", value_name = "FILTER")]
    filters: Vec<String>,

    /// Selection as VIEW:COL[,COL]=ID[,ID]
    #[arg(long)]
    select: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut viewport = Viewport::new(config.clone());
    let source = open_source(&cli.dataset, &config);
    let summary = viewport
        .load_from(source.as_ref())
        .await
        .with_context(|| format!("loading {}", cli.dataset.display()))?;
    info!("Dataset ready: {} rows", summary.row_count);

    if let Some(path) = &cli.settings {
        for (view, settings) in read_settings(path)? {
            viewport.set_view_settings(view, settings);
        }
    }

    for arg in &cli.filters {
        let (column, spec) = args::parse_filter(arg)?;
        viewport
            .set_filter(&column, spec)
            .with_context(|| format!("applying filter '{}'", arg))?;
    }
    let matched = viewport.apply_filters()?;

    let mut views = serde_json::Map::new();
    for (view, result) in viewport.render_all() {
        let entry = match result {
            Ok(dataset) => {
                assign_colors(&mut viewport, &dataset);
                serde_json::to_value(&dataset)?
            }
            Err(e) => json!({ "placeholder": e.to_string() }),
        };
        views.insert(view.name().to_string(), entry);
    }

    let highlights = match &cli.select {
        Some(arg) => {
            let event = args::parse_selection(arg)?;
            Some(viewport.select(&event)?)
        }
        None => None,
    };

    let report = json!({
        "source": summary,
        "dimensions": viewport.dimensions(),
        "filteredRows": matched,
        "views": views,
        "highlights": highlights,
        "colors": viewport.color_scale(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn open_source(path: &Path, config: &EngineConfig) -> Box<dyn DataSource> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        Box::new(CsvSource::from_path(path.to_path_buf(), config.csv.clone()))
    } else {
        Box::new(JsonSource::from_path(path.to_path_buf()))
    }
}

fn read_settings(path: &Path) -> Result<BTreeMap<ViewKind, ViewSettings>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading settings {}", path.display()))?;
    let settings: BTreeMap<ViewKind, ViewSettings> = serde_json::from_str(&text)
        .with_context(|| format!("parsing settings {}", path.display()))?;
    if settings.is_empty() {
        warn!("Settings file {} configures no views", path.display());
    }
    Ok(settings)
}

/// Give every entity shown in a view its shared colour
fn assign_colors(viewport: &mut Viewport, dataset: &ViewDataset) {
    match dataset {
        ViewDataset::AggregatedSeries(series) => {
            for entry in &series.entries {
                viewport.color_for(&entry.category);
            }
        }
        ViewDataset::AdjacencyMatrix(matrix) => {
            for entity in &matrix.entities {
                viewport.color_for(entity);
            }
        }
        ViewDataset::Graph(graph) => {
            for node in &graph.nodes {
                viewport.color_for(&node.id);
            }
        }
        ViewDataset::Hierarchy(root) => {
            for child in &root.children {
                viewport.color_for(&child.name);
            }
        }
    }
}
