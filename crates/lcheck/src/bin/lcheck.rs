//! lcheck CLI: detect L-marker checkerboards and render synthetic boards.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use nalgebra::Point2;

use lcheck::board::{Mirror, PixelSampling};
use lcheck::detect::{gray_view, to_image};
use lcheck::io::{load_gray, DetectConfig, DetectReport};
use lcheck::{render_board, BoardRenderSpec, CornerRecord};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

/// Exit status for failures outside the detector (I/O, bad arguments).
const EXIT_USAGE: u8 = 10;

#[derive(Parser)]
#[command(name = "lcheck")]
#[command(about = "Detect and index L-marker checkerboards in grayscale images")]
#[command(version)]
struct Cli {
    /// Log verbosity for the pipeline stages.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the board and write a JSON report. Exit status is the error code.
    Detect(DetectArgs),

    /// Render a synthetic L-marker board to a PNG file.
    Render(RenderArgs),
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Path to the input image (overrides `image_path` from --config).
    #[arg(long)]
    image: Option<PathBuf>,

    /// JSON config with `image_path`, `output_path` and `params`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report path. Without it and without a config `output_path`, the
    /// report is printed to stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Run correlation and refinement in parallel.
    #[arg(long)]
    parallel: bool,

    /// Override the minimum number of refined corners.
    #[arg(long)]
    min_corners: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// JSON `BoardRenderSpec`; command-line options override its fields.
    #[arg(long)]
    spec: Option<PathBuf>,

    #[arg(long)]
    rows: Option<usize>,

    #[arg(long)]
    cols: Option<usize>,

    /// Field side in pixels.
    #[arg(long)]
    field_size: Option<f64>,

    /// Zero point x; requires --zero-y.
    #[arg(long, requires = "zero_y")]
    zero_x: Option<f64>,

    /// Zero point y; requires --zero-x.
    #[arg(long, requires = "zero_x")]
    zero_y: Option<f64>,

    #[arg(long, value_enum)]
    mirror: Option<MirrorArg>,

    /// Rotate the field grid about the zero point, in degrees.
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<f64>,

    /// Average `scale × scale` sub-pixels per output pixel.
    #[arg(long)]
    scale: Option<usize>,

    /// Render a plain checkerboard without the L marker.
    #[arg(long)]
    no_marker: bool,

    /// Value of pixels exactly on a field boundary.
    #[arg(long)]
    transition: Option<u8>,

    /// Integrate each pixel with Simpson's rule instead of point sampling.
    #[arg(long)]
    area_sampling: bool,

    /// Also write the ground-truth corner records as JSON.
    #[arg(long)]
    truth: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MirrorArg {
    None,
    Rows,
    Cols,
    Both,
}

impl From<MirrorArg> for Mirror {
    fn from(m: MirrorArg) -> Self {
        match m {
            MirrorArg::None => Mirror::None,
            MirrorArg::Rows => Mirror::Rows,
            MirrorArg::Cols => Mirror::Cols,
            MirrorArg::Both => Mirror::Both,
        }
    }
}

fn init_logging(level: LevelFilter) {
    #[cfg(feature = "tracing")]
    lcheck::core::init_tracing(false, level);
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(e) = lcheck::core::init_with_level(level) {
            eprintln!("logger already installed: {e}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.into());

    let outcome = match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::Render(args) => run_render(&args).map(|()| 0),
    };
    match outcome {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(EXIT_USAGE)),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn load_config(args: &DetectArgs) -> CliResult<DetectConfig> {
    let mut cfg = match (&args.config, &args.image) {
        (Some(path), _) => DetectConfig::load_json(path)?,
        (None, Some(image)) => DetectConfig::new(image.to_string_lossy()),
        (None, None) => return Err("either --image or --config is required".into()),
    };
    if let Some(image) = &args.image {
        cfg.image_path = image.to_string_lossy().into_owned();
    }
    if let Some(out) = &args.out {
        cfg.output_path = Some(out.to_string_lossy().into_owned());
    }
    let mut params = cfg.build_params().with_parallel(args.parallel);
    if let Some(min) = args.min_corners {
        params.min_corners = min;
    }
    cfg.params = Some(params);
    Ok(cfg)
}

fn run_detect(args: &DetectArgs) -> CliResult<i32> {
    let cfg = load_config(args)?;
    let img = load_gray(&cfg.image_path)?;
    let view = gray_view(&img);
    info!("loaded {} ({}x{})", cfg.image_path, view.width, view.height);

    let mut report = DetectReport::new(&cfg.image_path, view.width, view.height);
    let result = cfg.build_detector().and_then(|d| d.detect(&view));
    report.set_result(&result);
    if let Err(e) = &result {
        eprintln!("detection failed (code {}): {e}", e.code());
    }

    match &cfg.output_path {
        Some(path) => {
            report.write_json(path)?;
            info!("report written to {path}");
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(report.code)
}

fn render_spec(args: &RenderArgs) -> CliResult<BoardRenderSpec> {
    let mut spec = match &args.spec {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => BoardRenderSpec::default(),
    };
    if let Some(rows) = args.rows {
        spec.rows = rows;
    }
    if let Some(cols) = args.cols {
        spec.cols = cols;
    }
    if let Some(field_size) = args.field_size {
        spec.field_size = field_size;
    }
    if let (Some(x), Some(y)) = (args.zero_x, args.zero_y) {
        spec.zero_point = Some(Point2::new(x, y));
    }
    if let Some(mirror) = args.mirror {
        spec.mirror = mirror.into();
    }
    if let Some(rotation) = args.rotation {
        spec.rotation_deg = rotation;
    }
    if let Some(scale) = args.scale {
        spec.scale = scale;
    }
    if args.no_marker {
        spec.marker = false;
    }
    if let Some(transition) = args.transition {
        spec.transition_value = transition;
    }
    if args.area_sampling {
        spec.sampling = PixelSampling::Simpson;
    }
    if spec.rows == 0 || spec.cols == 0 || spec.field_size.is_nan() || spec.field_size <= 0.0 {
        return Err("board needs at least one field and a positive field size".into());
    }
    if spec.scale == 0 {
        return Err("scale must be at least 1".into());
    }
    Ok(spec)
}

fn write_truth(spec: &BoardRenderSpec, path: &Path) -> CliResult<()> {
    let records: Vec<CornerRecord> = spec
        .expected_corners()
        .into_iter()
        .map(|(idx, p)| CornerRecord {
            x: p.x,
            y: p.y,
            i: idx.i,
            j: idx.j,
        })
        .collect();
    std::fs::write(path, serde_json::to_string_pretty(&records)?)?;
    Ok(())
}

fn run_render(args: &RenderArgs) -> CliResult<()> {
    let spec = render_spec(args)?;
    let board = render_board(&spec);
    to_image(&board)?.save(&args.out)?;
    info!(
        "rendered {}x{} board to {}",
        board.width,
        board.height,
        args.out.display()
    );
    if let Some(path) = &args.truth {
        write_truth(&spec, path)?;
    }
    Ok(())
}
