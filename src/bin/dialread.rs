//! dialread - read the time from an analog watch photo.
//!
//! Stands in for the capture source and the presenter: decodes one image
//! file into an upright frame, drives it through the pipeline worker, and
//! prints the resulting status line (plus the overlay rectangle when a
//! display surface was given).

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use dialread::{DialConfig, DisplaySize, Frame, Pipeline, PipelineWorker, ReadStrategy, Rotation};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the captured image (JPEG or PNG).
    image: String,
    /// Strategy override: local, remote or local-then-remote.
    #[arg(long)]
    strategy: Option<String>,
    /// Watch-face detector model path (stub:// selects the built-in stub).
    #[arg(long, env = "DIALREAD_DETECTOR_MODEL")]
    detector_model: Option<String>,
    /// Watch-hands landmark model path.
    #[arg(long, env = "DIALREAD_HANDS_MODEL")]
    hands_model: Option<String>,
    /// Clockwise rotation to apply at decode time (0, 90, 180 or 270).
    #[arg(long, default_value_t = 0)]
    rotate: u32,
    /// Display surface for overlay projection, as WIDTHxHEIGHT (e.g. 1080x1920).
    #[arg(long)]
    overlay: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = DialConfig::load()?;
    if let Some(strategy) = &args.strategy {
        cfg.strategy = ReadStrategy::parse(strategy)?;
    }
    if let Some(path) = &args.detector_model {
        cfg.detector_model = path.clone();
    }
    if let Some(path) = &args.hands_model {
        cfg.hands_model = path.clone();
    }
    if let Some(overlay) = &args.overlay {
        cfg.display = Some(parse_display(overlay)?);
    }

    let pipeline = Pipeline::from_config(&cfg)?;
    log::info!(
        "pipeline ready: strategy={} detector={} hands={}",
        cfg.strategy.as_str(),
        cfg.detector_model,
        cfg.hands_model
    );
    let worker = PipelineWorker::spawn(pipeline)?;

    let rotation = Rotation::from_degrees(args.rotate)?;
    let frame = Frame::open(&args.image, rotation)
        .with_context(|| format!("capture failed for {}", args.image))?;
    log::info!("captured frame {}x{}", frame.width(), frame.height());

    let reading = worker
        .submit(frame)?
        .recv()
        .context("pipeline worker dropped the reading")?;

    if let Some(bbox) = &reading.overlay_box {
        println!(
            "overlay: left={:.0} top={:.0} right={:.0} bottom={:.0}",
            bbox.left, bbox.top, bbox.right, bbox.bottom
        );
    }
    println!("{}", reading.outcome.status_line());

    worker.shutdown();
    Ok(())
}

fn parse_display(value: &str) -> Result<DisplaySize> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| anyhow!("overlay size must look like 1080x1920, got '{}'", value))?;
    Ok(DisplaySize {
        width: width
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid overlay width '{}'", width))?,
        height: height
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid overlay height '{}'", height))?,
    })
}
