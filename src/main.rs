//! # Tableau CLI
//!
//! Command-line interface for the e-paper dashboard pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a raster to a 1-bit BMP in panel orientation
//! tableau convert dashboard.png frame.bmp --rotation cw90
//!
//! # Present a dashboard on the simulated panel, saving PNG snapshots
//! tableau show dashboard.png --out snapshots/
//!
//! # Present a dashboard followed by 12 clock updates
//! tableau clock dashboard.png --count 12
//!
//! # Log panel calls without simulating the glass
//! tableau --debug show dashboard.png --dry-run
//! ```

use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use image::{DynamicImage, RgbImage, imageops::FilterType};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tableau::{
    Dashboard, RefreshOutcome, TableauError,
    config::DashboardConfig,
    panel::{ContentChanges, PanelDriver, mock::RecordingPanel, snapshot::SnapshotPanel},
    render::{assemble, rotation::Rotation, surface},
};

/// Tableau - E-paper dashboard utility
#[derive(Parser, Debug)]
#[command(name = "tableau")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (defaults to the Waveshare 7.5" V2 layout)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a raster image to a 1-bit BMP
    Convert {
        /// Input image (PNG, JPEG, BMP, ...)
        input: PathBuf,

        /// Output BMP file
        output: PathBuf,

        /// Rotation to panel orientation (none, cw90, cw180, cw270); defaults to the config
        #[arg(long, value_parser = parse_rotation)]
        rotation: Option<Rotation>,

        /// Also save a PNG preview of the packed frame
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
    },

    /// Present a dashboard image on the simulated panel
    Show {
        /// Rendered dashboard in logical orientation
        input: PathBuf,

        /// Directory for panel snapshots
        #[arg(long, default_value = "snapshots")]
        out: PathBuf,

        /// Sections that changed (weather, menu, calendar)
        #[arg(long, value_delimiter = ',', default_value = "weather,menu,calendar")]
        changes: Vec<String>,

        /// Record panel calls instead of simulating the panel
        #[arg(long)]
        dry_run: bool,
    },

    /// Present a dashboard, then a series of one-minute clock updates
    Clock {
        /// Rendered dashboard in logical orientation
        input: PathBuf,

        /// Number of clock updates
        #[arg(long, default_value_t = 12)]
        count: u32,

        /// Directory for panel snapshots
        #[arg(long, default_value = "snapshots")]
        out: PathBuf,

        /// Record panel calls instead of simulating the panel
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<(), TableauError> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    match cli.command {
        Commands::Convert {
            input,
            output,
            rotation,
            png,
        } => {
            let rotation = rotation.unwrap_or(config.panel.rotation);
            let raster = surface::load_rgb(&input)?;
            info!(
                input = %input.display(),
                width = raster.width(),
                height = raster.height(),
                %rotation,
                "Converting"
            );

            let frame = assemble::assemble_full(&raster, rotation)?;
            frame.write_bmp(&output)?;
            info!(output = %output.display(), "Wrote {}x{} BMP", frame.width(), frame.height());

            if let Some(png_path) = png {
                frame
                    .to_gray_image()
                    .save(&png_path)
                    .map_err(|e| TableauError::Image(format!("Failed to save PNG: {}", e)))?;
                info!(path = %png_path.display(), "Saved preview");
            }
        }

        Commands::Show {
            input,
            out,
            changes,
            dry_run,
        } => {
            let changes = parse_changes(&changes)?;
            let raster = load_dashboard(&input, &config)?;
            if dry_run {
                let (w, h) = (config.panel.width, config.panel.height);
                let panel = run_session(RecordingPanel::new(w, h), &config, &raster, changes, 0)?;
                info!(calls = ?panel.calls(), "Dry run finished");
            } else {
                let panel = run_session(snapshot_panel(&config, &out)?, &config, &raster, changes, 0)?;
                info!(refreshes = panel.refreshes(), out = %out.display(), "Done");
            }
        }

        Commands::Clock {
            input,
            count,
            out,
            dry_run,
        } => {
            let raster = load_dashboard(&input, &config)?;
            if dry_run {
                let (w, h) = (config.panel.width, config.panel.height);
                let panel = run_session(RecordingPanel::new(w, h), &config, &raster, ContentChanges::all(), count)?;
                info!(calls = panel.calls().len(), "Dry run finished");
            } else {
                let panel = run_session(
                    snapshot_panel(&config, &out)?,
                    &config,
                    &raster,
                    ContentChanges::all(),
                    count,
                )?;
                info!(refreshes = panel.refreshes(), out = %out.display(), "Done");
            }
        }
    }

    Ok(())
}

/// Start the panel, present the dashboard, run `clock_updates` clock cycles
/// one simulated minute apart, then put the panel to sleep.
fn run_session<D: PanelDriver>(
    driver: D,
    config: &DashboardConfig,
    raster: &RgbImage,
    changes: ContentChanges,
    clock_updates: u32,
) -> Result<D, TableauError> {
    let mut dashboard = Dashboard::new(driver, config.geometry()?, config.policy()?)?;
    dashboard.start()?;

    let start = Utc::now();
    let outcome = dashboard.present(raster, changes, start)?;
    info!(?outcome, "Dashboard cycle");

    for minute in 1..=clock_updates {
        let now = start + TimeDelta::minutes(i64::from(minute));
        match dashboard.present_clock_from_frame(raster, now) {
            Ok(RefreshOutcome::Region(region)) => info!(minute, %region, "Clock patch"),
            Ok(outcome) => info!(minute, ?outcome, "Clock cycle"),
            // The panel keeps its last image; later cycles retry.
            Err(e) if e.is_recoverable() => continue,
            Err(e) => return Err(e),
        }
    }

    dashboard.shutdown()?;
    Ok(dashboard.into_driver())
}

fn snapshot_panel(config: &DashboardConfig, out: &Path) -> Result<SnapshotPanel, TableauError> {
    std::fs::create_dir_all(out)?;
    Ok(SnapshotPanel::new(config.panel.width, config.panel.height)?.with_output_dir(out))
}

/// Load a dashboard raster, resizing it to the logical panel size if needed.
fn load_dashboard(path: &Path, config: &DashboardConfig) -> Result<RgbImage, TableauError> {
    let raster = surface::load_rgb(path)?;
    let (lw, lh) = config.geometry()?.logical_size();

    if raster.dimensions() == (lw, lh) {
        return Ok(raster);
    }

    warn!(
        from = ?raster.dimensions(),
        to = ?(lw, lh),
        "Dashboard size differs from panel, resizing"
    );
    Ok(DynamicImage::ImageRgb8(raster)
        .resize_to_fill(lw, lh, FilterType::Lanczos3)
        .into_rgb8())
}

fn parse_rotation(name: &str) -> Result<Rotation, String> {
    Rotation::from_name(name).ok_or_else(|| format!("unknown rotation '{}' (none, cw90, cw180, cw270)", name))
}

fn parse_changes(names: &[String]) -> Result<ContentChanges, TableauError> {
    names.iter().try_fold(ContentChanges::empty(), |acc, name| {
        let flag = ContentChanges::from_name(&name.trim().to_ascii_uppercase())
            .ok_or_else(|| TableauError::Config(format!("unknown content section '{}'", name)))?;
        Ok(acc | flag)
    })
}
