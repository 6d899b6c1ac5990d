//! squaremark CLI — extract, orient and re-render square marker arrays.

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::io::Cursor;
use std::path::{Path, PathBuf};

use squaremark::{
    assign_orientations, colorize_labels, render_markers, Connectivity, DocumentFormat,
    ExtractConfig, Extractor, MarkerFile, OrientationWeights, Point, Polarity, RegionLabels,
    RenderOptions, SegmentConfig,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

/// Seed of the debug label colour map.
const LABEL_COLOR_SEED: u64 = 0x5EED;

#[derive(Parser)]
#[command(name = "squaremark")]
#[command(about = "Extract square fiducial markers from images and re-render them as vector art")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment an image and fit one marker per region.
    Extract(CliExtractArgs),

    /// Estimate nearest-neighbour orientations for a marker file.
    FindOrientations(CliOrientArgs),

    /// Manually set the orientation of a single marker.
    SetOrientation(CliSetOrientationArgs),

    /// Render a marker file as an SVG or EPS document.
    Render(CliRenderArgs),

    /// Print a summary of a marker file.
    Info {
        /// Marker file (JSON).
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliExtractArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write the marker file (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Replace `--out` if it already exists.
    #[arg(long)]
    overwrite: bool,

    /// Binarization threshold in [0, 1].
    #[arg(long, default_value = "0.5")]
    threshold: f32,

    /// Which side of the threshold holds the markers.
    #[arg(long, value_enum, default_value_t = PolarityArg::DarkOnLight)]
    polarity: PolarityArg,

    /// Pixel adjacency for region labelling.
    #[arg(long, value_enum, default_value_t = ConnectivityArg::Four)]
    connectivity: ConnectivityArg,

    /// Estimate orientations right after fitting.
    #[arg(long)]
    orient: bool,

    #[command(flatten)]
    weights: WeightArgs,

    /// Write a colour-coded label image (PNG) for debugging segmentation.
    #[arg(long)]
    debug_labels: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct WeightArgs {
    /// Neighbour-search weight along x (larger prefers horizontal neighbours).
    #[arg(long, default_value = "1.0")]
    weight_x: f64,

    /// Neighbour-search weight along y (larger prefers vertical neighbours).
    #[arg(long, default_value = "1.0")]
    weight_y: f64,
}

impl WeightArgs {
    fn to_core(&self) -> OrientationWeights {
        OrientationWeights::new(self.weight_x, self.weight_y)
    }
}

#[derive(Debug, Clone, Args)]
struct CliOrientArgs {
    /// Marker file to read.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the result; defaults to updating `--input` in place.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Replace `--out` if it already exists.
    #[arg(long, requires = "out")]
    overwrite: bool,

    #[command(flatten)]
    weights: WeightArgs,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("value").required(true).args(["angle", "degrees", "toward"])))]
struct CliSetOrientationArgs {
    /// Marker file, updated in place.
    #[arg(long)]
    input: PathBuf,

    /// Zero-based marker index.
    #[arg(long)]
    index: usize,

    /// Orientation in radians.
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<f64>,

    /// Orientation in degrees.
    #[arg(long, allow_negative_numbers = true)]
    degrees: Option<f64>,

    /// Point the marker toward this pixel position.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    toward: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Args)]
struct CliRenderArgs {
    /// Marker file (JSON) with every orientation set.
    #[arg(long)]
    input: PathBuf,

    /// Path of the vector document to write.
    #[arg(long)]
    out: PathBuf,

    /// Replace `--out` if it already exists.
    #[arg(long)]
    overwrite: bool,

    /// Render options (JSON); flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw every marker with the mean radius.
    #[arg(long)]
    mean_radius: bool,

    /// Target frame aspect ratio (width / height).
    #[arg(long)]
    frame_ratio: Option<f64>,

    /// Uniform frame margin scale (1.0 = tight).
    #[arg(long)]
    frame_margin: Option<f64>,

    /// Omit the frame.
    #[arg(long, conflicts_with = "double_frame")]
    no_frame: bool,

    /// Add a thinner outer border.
    #[arg(long)]
    double_frame: bool,

    /// Output format; inferred from the `--out` extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolarityArg {
    DarkOnLight,
    BrightOnDark,
}

impl PolarityArg {
    fn to_core(self) -> Polarity {
        match self {
            Self::DarkOnLight => Polarity::DarkOnLight,
            Self::BrightOnDark => Polarity::BrightOnDark,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConnectivityArg {
    Four,
    Eight,
}

impl ConnectivityArg {
    fn to_core(self) -> Connectivity {
        match self {
            Self::Four => Connectivity::Four,
            Self::Eight => Connectivity::Eight,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Svg,
    Eps,
}

impl FormatArg {
    fn to_core(self) -> DocumentFormat {
        match self {
            Self::Svg => DocumentFormat::Svg,
            Self::Eps => DocumentFormat::Eps,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => run_extract(&args),
        Commands::FindOrientations(args) => run_find_orientations(&args),
        Commands::SetOrientation(args) => run_set_orientation(&args),
        Commands::Render(args) => run_render(&args),
        Commands::Info { input } => run_info(&input),
    }
}

/// Refuse to clobber an existing file unless `overwrite` is set.
fn ensure_writable(path: &Path, overwrite: bool) -> CliResult<()> {
    if path.exists() && !overwrite {
        return Err(format!(
            "{} already exists; pass --overwrite to replace it",
            path.display()
        )
        .into());
    }
    Ok(())
}

fn load_markers(path: &Path) -> CliResult<MarkerFile> {
    MarkerFile::from_json_file(path).map_err(|e| -> CliError {
        format!("Failed to load markers from {}: {}", path.display(), e).into()
    })
}

// ── extract ────────────────────────────────────────────────────────────

fn run_extract(args: &CliExtractArgs) -> CliResult<()> {
    ensure_writable(&args.out, args.overwrite)?;
    if let Some(path) = &args.debug_labels {
        ensure_writable(path, args.overwrite)?;
    }

    tracing::info!("Loading image: {}", args.image.display());
    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    let intensity = img.to_luma32f();
    let (w, h) = intensity.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let config = ExtractConfig {
        segment: SegmentConfig {
            threshold: args.threshold,
            polarity: args.polarity.to_core(),
            connectivity: args.connectivity.to_core(),
        },
        orient: args.orient.then(|| args.weights.to_core()),
    };
    let (result, labels) = Extractor::new(config).extract_with_labels(&intensity)?;
    tracing::info!(
        "Extracted {} markers ({} oriented)",
        result.markers.len(),
        result.n_oriented()
    );

    let json = result.to_json_string()?;
    let label_png = match &args.debug_labels {
        Some(_) => Some(encode_label_png(&labels)?),
        None => None,
    };

    std::fs::write(&args.out, json)?;
    tracing::info!("Markers written to {}", args.out.display());
    if let (Some(path), Some(png)) = (&args.debug_labels, label_png) {
        std::fs::write(path, png)?;
        tracing::info!("Label image written to {}", path.display());
    }

    Ok(())
}

fn encode_label_png(labels: &RegionLabels) -> CliResult<Vec<u8>> {
    let mut png = Vec::new();
    colorize_labels(labels, LABEL_COLOR_SEED)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

// ── find-orientations ──────────────────────────────────────────────────

/// Target of `find-orientations`: `--out` (checked against `--overwrite`) or
/// the input file itself.
fn orientation_target(args: &CliOrientArgs) -> CliResult<&Path> {
    match args.out.as_deref() {
        Some(out) => {
            ensure_writable(out, args.overwrite)?;
            Ok(out)
        }
        None => Ok(args.input.as_path()),
    }
}

fn run_find_orientations(args: &CliOrientArgs) -> CliResult<()> {
    let out = orientation_target(args)?;
    let mut file = load_markers(&args.input)?;
    assign_orientations(&mut file.markers, &args.weights.to_core())?;

    file.write_json_file(out)?;
    tracing::info!(
        "Orientations for {} markers written to {}",
        file.markers.len(),
        out.display()
    );
    Ok(())
}

// ── set-orientation ────────────────────────────────────────────────────

fn run_set_orientation(args: &CliSetOrientationArgs) -> CliResult<()> {
    let mut file = load_markers(&args.input)?;
    let n = file.markers.len();
    let marker = file.markers.get_mut(args.index).ok_or_else(|| -> CliError {
        format!("marker index {} out of range ({} markers)", args.index, n).into()
    })?;

    let updated = match (args.angle, args.degrees, args.toward.as_deref()) {
        (Some(rad), _, _) => marker.set_orientation(rad),
        (_, Some(deg), _) => marker.set_orientation(deg.to_radians()),
        (_, _, Some([x, y])) => marker.orient_towards(Point::new(*x, *y)),
        _ => return Err("one of --angle, --degrees or --toward X Y is required".into()),
    };
    if !updated {
        return Err(format!("could not set orientation of marker {}", args.index).into());
    }
    let angle = marker.orientation.unwrap_or_default();

    file.write_json_file(&args.input)?;
    tracing::info!(
        "Marker {} orientation set to {:.4} rad ({:.1} deg)",
        args.index,
        angle,
        angle.to_degrees()
    );
    Ok(())
}

// ── render ─────────────────────────────────────────────────────────────

fn build_render_options(args: &CliRenderArgs) -> CliResult<RenderOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str::<RenderOptions>(&data).map_err(|e| -> CliError {
                format!("Failed to parse render config {}: {}", path.display(), e).into()
            })?
        }
        None => RenderOptions::default(),
    };
    if args.mean_radius {
        options.use_mean_radius = true;
    }
    if let Some(r) = args.frame_ratio {
        options.frame_ratio = Some(r);
    }
    if let Some(m) = args.frame_margin {
        options.frame_margin = m;
    }
    if args.no_frame {
        options.frame = false;
    }
    if args.double_frame {
        options.double_frame = true;
    }
    Ok(options)
}

fn run_render(args: &CliRenderArgs) -> CliResult<()> {
    ensure_writable(&args.out, args.overwrite)?;
    let options = build_render_options(args)?;
    let file = load_markers(&args.input)?;

    let doc = render_markers(&file.markers, &options)?;
    let format = args
        .format
        .map(FormatArg::to_core)
        .unwrap_or_else(|| DocumentFormat::from_path(&args.out));
    let text = doc.serialize(format);

    std::fs::write(&args.out, text)?;
    tracing::info!(
        "Rendered {} markers ({:?}, {:.1}x{:.1}) to {}",
        file.markers.len(),
        format,
        doc.bounds.width(),
        doc.bounds.height(),
        args.out.display()
    );
    Ok(())
}

// ── info ───────────────────────────────────────────────────────────────

fn run_info(input: &Path) -> CliResult<()> {
    let file = load_markers(input)?;

    println!("squaremark marker file: {}", input.display());
    println!("  markers:        {}", file.markers.len());
    println!("  oriented:       {}", file.n_oriented());
    if let Some([w, h]) = file.image_size {
        println!("  image size:     {}x{}", w, h);
    }
    if let Some(r) = file.mean_radius() {
        println!("  mean radius:    {:.3} px", r);
    }
    if let Some(b) = file.bounds() {
        println!(
            "  positions:      x [{:.1}, {:.1}]  y [{:.1}, {:.1}]",
            b.x0, b.x1, b.y0, b.y1
        );
    }

    Ok(())
}
