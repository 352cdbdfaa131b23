mod app;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bubble_motion::motion::{DensityPreset, MotionConfig, MotionConfigPatch};
use bubble_motion::records::RecordSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with a record array or an object holding `records`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Number of synthetic records shown when no data file is given.
    #[arg(long, default_value_t = 36)]
    demo: usize,

    /// Record field used when clicking a bubble clusters the chart.
    #[arg(long)]
    group_field: Option<String>,

    #[arg(long, value_enum)]
    density: Option<DensityPreset>,

    /// Velocity decay in `[0, 1]`.
    #[arg(long)]
    decay: Option<f32>,

    /// JSON motion configuration patch applied before the other flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable click-to-cluster.
    #[arg(long)]
    no_filtering: bool,
}

impl Args {
    fn source(&self) -> RecordSource {
        match &self.data {
            Some(path) => RecordSource::File(path.clone()),
            None => RecordSource::Demo(self.demo),
        }
    }

    fn cli_patch(&self) -> MotionConfigPatch {
        MotionConfigPatch {
            density: self.density,
            velocity_decay: self.decay,
            group_field: self.group_field.clone(),
            interactive_filtering: self.no_filtering.then_some(false),
            ..MotionConfigPatch::default()
        }
    }

    /// Config file first, then flags. Each patch applies its density preset
    /// before its explicit values.
    fn motion_config(&self) -> Result<MotionConfig> {
        let mut config = MotionConfig::default();

        if let Some(path) = &self.config {
            config
                .apply_patch(&read_config_patch(path)?)
                .with_context(|| format!("invalid motion config in {}", path.display()))?;
        }

        config
            .apply_patch(&self.cli_patch())
            .context("invalid motion options")?;
        Ok(config)
    }
}

fn read_config_patch(path: &Path) -> Result<MotionConfigPatch> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let source = args.source();
    let config = args.motion_config()?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "bubble-motion",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::BubbleChartApp::new(cc, source, config)))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
