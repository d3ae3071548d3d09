use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, ImageReader};
use keytrack_cli::render::{draw_keypoints, draw_matches};
use keytrack_cli::{
    keytrack_core::init_thread_pool, DescriptorKind, DetectorKind, DistanceMetric, Frame, Pipeline,
    PipelineConfig,
};
use keytrack_detect::DetectorConfig;
use keytrack_describe::DescriptorConfig;
use keytrack_match::SelectorKind;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "keytrack", version, about = "Keypoint detection and matching between images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect keypoints in one image
    Detect {
        image: PathBuf,
        /// Write the image with keypoints drawn
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: PipelineArgs,
    },
    /// Track keypoints from one image to another
    Match {
        source: PathBuf,
        reference: PathBuf,
        /// Write both images side by side with match lines
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[command(flatten)]
        options: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// JSON or TOML pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// harris, shi-tomasi, fast or orb
    #[arg(long)]
    detector: Option<DetectorKind>,
    /// brief or patch
    #[arg(long)]
    descriptor: Option<DescriptorKind>,
    /// hamming or l2
    #[arg(long)]
    metric: Option<DistanceMetric>,
    /// nn or knn
    #[arg(long)]
    selector: Option<SelectorKind>,
    #[arg(long)]
    ratio: Option<f32>,
    #[arg(long)]
    min_response: Option<f32>,
    #[arg(long)]
    max_overlap: Option<f32>,
    /// Keep only mutual nearest neighbours
    #[arg(long)]
    cross_check: bool,
    #[arg(long)]
    threads: Option<usize>,
}

impl PipelineArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        for entry in self.apply_overrides(&mut config) {
            debug!("CLI override: {}", entry);
        }
        config.validate().context("invalid pipeline configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut PipelineConfig) -> Vec<String> {
        let mut overrides = Vec::new();

        if let Some(kind) = self.detector {
            if config.detector.kind != kind {
                config.detector = DetectorConfig::new(kind);
                overrides.push(format!("detector = {}", kind));
            }
        }
        if let Some(kind) = self.descriptor {
            if config.descriptor.kind != kind {
                config.descriptor = DescriptorConfig::new(kind);
                config.matcher.metric = PipelineConfig::matcher_for(kind).metric;
                overrides.push(format!("descriptor = {}", kind));
            }
        }
        if let Some(metric) = self.metric {
            config.matcher.metric = metric;
            overrides.push(format!("metric = {}", metric));
        }
        if let Some(selector) = self.selector {
            config.matcher.selector = selector;
            overrides.push(format!("selector = {}", selector));
        }
        if let Some(ratio) = self.ratio {
            config.matcher.ratio = ratio;
            overrides.push(format!("ratio = {}", ratio));
        }
        if let Some(min_response) = self.min_response {
            config.detector.min_response = min_response;
            overrides.push(format!("min_response = {}", min_response));
        }
        if let Some(max_overlap) = self.max_overlap {
            config.detector.max_overlap = max_overlap;
            overrides.push(format!("max_overlap = {}", max_overlap));
        }
        if self.cross_check {
            config.matcher.cross_check = true;
            overrides.push("cross_check = true".to_string());
        }
        if let Some(threads) = self.threads {
            config.n_threads = threads;
            overrides.push(format!("threads = {}", threads));
        }

        overrides
    }
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.target(env_logger::Target::Stderr);
    if let Err(err) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

fn build_pipeline(options: &PipelineArgs) -> Result<Pipeline> {
    let config = options.resolve()?;
    if let Err(err) = init_thread_pool(config.n_threads) {
        warn!("thread pool already initialized: {}", err);
    }
    Ok(Pipeline::new(config)?)
}

fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(img.to_luma8())
}

fn run_detect(image: &Path, output: Option<&Path>, options: &PipelineArgs) -> Result<()> {
    let pipeline = build_pipeline(options)?;
    let img = load_gray(image)?;
    let (w, h) = img.dimensions();

    let keypoints = pipeline.detect(img.as_raw(), w as usize, h as usize)?;
    println!("Detected {} keypoints in {}", keypoints.len(), image.display());

    if let Some(path) = output {
        draw_keypoints(&img, &keypoints)
            .save(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        info!("Saved keypoint image as {}", path.display());
    }
    Ok(())
}

fn run_match(source: &Path, reference: &Path, output: Option<&Path>, options: &PipelineArgs) -> Result<()> {
    let pipeline = build_pipeline(options)?;
    let img_a = load_gray(source)?;
    let img_b = load_gray(reference)?;

    let t0 = Instant::now();
    let track = pipeline.track(
        Frame::new(img_a.as_raw(), img_a.width() as usize, img_a.height() as usize),
        Frame::new(img_b.as_raw(), img_b.width() as usize, img_b.height() as usize),
    )?;
    info!("Tracking took {:.2?}", t0.elapsed());

    println!(
        "Keypoints: {} / {}",
        track.source_keypoints.len(),
        track.reference_keypoints.len()
    );
    println!(
        "Matches: {} of {} candidates ({} removed)",
        track.report.matches.len(),
        track.report.candidates,
        track.report.removed
    );

    if let Some(path) = output {
        draw_matches(&img_a, &img_b, &track)
            .save(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        info!("Saved match image as {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    match &cli.command {
        Command::Detect { image, output, options } => run_detect(image, output.as_deref(), options),
        Command::Match {
            source,
            reference,
            output,
            options,
        } => run_match(source, reference, output.as_deref(), options),
    }
}
