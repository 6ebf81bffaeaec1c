use std::fmt;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use compute::TimeResolution;
use formats::{
    BoundaryFileSource, BoundarySchema, CsvFileSource, LoadError, RecordSchema, load_dataset,
};
use scene::{RecordFields, SceneController, ViewConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod session;
mod svg;

use svg::SvgRenderer;

#[derive(Parser, Debug)]
#[command(author, version, about = "Drill-down explorer for categorised event records")]
struct Args {
    /// Headered CSV of event records
    #[arg(long, env = "EXPLORER_RECORDS")]
    records: PathBuf,

    /// TopoJSON topology (or GeoJSON FeatureCollection) of named regions
    #[arg(long, env = "EXPLORER_BOUNDARIES")]
    boundaries: PathBuf,

    /// Topology object holding the regions; the first object in the file if omitted
    #[arg(long, env = "EXPLORER_BOUNDARY_OBJECT")]
    boundary_object: Option<String>,

    /// Feature property carrying the region name
    #[arg(long, env = "EXPLORER_BOUNDARY_NAME", default_value = "name")]
    boundary_name: String,

    #[arg(long, env = "EXPLORER_CATEGORY_COLUMN", default_value = "category")]
    category_column: String,

    #[arg(long, env = "EXPLORER_SUB_CATEGORY_COLUMN", default_value = "sub_category")]
    sub_category_column: String,

    #[arg(long, env = "EXPLORER_TIMESTAMP_COLUMN", default_value = "timestamp")]
    timestamp_column: String,

    #[arg(long, env = "EXPLORER_WIDTH", default_value_t = 960.0)]
    width: f64,

    #[arg(long, env = "EXPLORER_HEIGHT", default_value_t = 600.0)]
    height: f64,

    /// Fraction of each band left empty in the breakdown chart
    #[arg(long, env = "EXPLORER_BAND_PADDING", default_value_t = 0.1)]
    band_padding: f64,

    /// exact | day | month
    #[arg(long, env = "EXPLORER_TREND_RESOLUTION", default_value_t = TimeResolution::Exact)]
    trend_resolution: TimeResolution,

    /// Directory receiving one SVG per rendered view
    #[arg(long, env = "EXPLORER_OUT_DIR", default_value = "out")]
    out_dir: PathBuf,
}

impl Args {
    fn view_config(&self) -> ViewConfig {
        ViewConfig {
            width: self.width,
            height: self.height,
            band_padding: self.band_padding.clamp(0.0, 1.0),
            trend_resolution: self.trend_resolution,
            ..ViewConfig::default()
        }
    }
}

#[derive(Debug)]
enum AppError {
    Load(LoadError),
    Io(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Load(e) => write!(f, "{e}"),
            AppError::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), AppError> {
    let records = CsvFileSource::new(
        &args.records,
        RecordSchema {
            category: args.category_column.clone(),
            sub_category: args.sub_category_column.clone(),
            timestamp: args.timestamp_column.clone(),
        },
    );
    let boundaries = BoundaryFileSource::new(
        &args.boundaries,
        BoundarySchema {
            object: args.boundary_object.clone(),
            name_property: args.boundary_name.clone(),
        },
    );

    let dataset = match load_dataset(&records, &boundaries).await {
        Ok(dataset) => dataset,
        Err(e) => {
            if e.is_schema_mismatch() {
                error!("input does not match the configured columns or boundary object");
            }
            return Err(AppError::Load(e));
        }
    };

    let mut controller = SceneController::new(dataset, RecordFields, args.view_config());
    let mut renderer = SvgRenderer::new(&args.out_dir)?;
    info!(out_dir = %args.out_dir.display(), "rendering views");

    let renders = session::run(
        &mut controller,
        &mut renderer,
        io::stdin().lock(),
        io::stdout().lock(),
    )?;
    info!(renders, "session finished");
    Ok(())
}
