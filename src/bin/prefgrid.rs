use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use prefgrid::assets::crop::{CropArea, CropOptions, crop_region, crop_to_aspect};
use prefgrid::assets::decode::decode_dynamic;
use prefgrid::assets::source::to_data_uri;
use prefgrid::export::deliver::{Delivered, Delivery, DeliveryMode, EnvironmentSignal};
use prefgrid::export::quality::{Exporter, JpegExportEncoder, MAX_EXPORT_BYTES};
use prefgrid::search::stream::{LineDecoder, SearchStatus};
use prefgrid::{
    CanvasConfig, CellId, CpuSurface, DroppedFile, FsFetcher, GridController, HitTarget,
    HostCall, JsonCellStore, JsonKeyValueStore, Locale, Preferences, RecordingHost, SearchFeed,
    SystemClock, Variant, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "prefgrid", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the stored grid as a PNG at a given scale.
    Render(RenderArgs),
    /// Export the stored grid as a size-budgeted JPEG.
    Export(ExportArgs),
    /// Crop an image to a 3:4 cover JPEG.
    Crop(CropArgs),
    /// Write a canvas configuration preset as JSON.
    Init(InitArgs),
    /// Resolve a canvas point to its click target.
    Hit(HitArgs),
    /// Drop an image file onto the grid at a canvas point and store the result.
    Drop(DropArgs),
    /// List results from a saved search stream, optionally storing one in a cell.
    Pick(PickArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VariantChoice {
    Movie,
    Game,
}

impl From<VariantChoice> for Variant {
    fn from(v: VariantChoice) -> Self {
        match v {
            VariantChoice::Movie => Variant::Movie,
            VariantChoice::Game => Variant::Game,
        }
    }
}

#[derive(clap::Args, Debug)]
struct GridArgs {
    /// Product variant.
    #[arg(long, value_enum, default_value_t = VariantChoice::Movie)]
    variant: VariantChoice,

    /// Locale tag (normalized; unsupported tags fall back to zh-CN).
    #[arg(long, default_value = "zh-CN")]
    locale: String,

    /// Directory holding the cell and preference stores.
    #[arg(long, default_value = ".")]
    store_dir: PathBuf,

    /// Root for same-origin image paths.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Custom canvas configuration JSON (must match the variant's cell count).
    #[arg(long)]
    config: Option<PathBuf>,

    /// TTF/OTF font for text. Common system fonts are probed when omitted.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    grid: GridArgs,

    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    grid: GridArgs,

    #[arg(long, default_value_t = 2.0)]
    scale: f64,

    /// Encoded size budget in bytes.
    #[arg(long, default_value_t = MAX_EXPORT_BYTES)]
    budget: usize,

    /// Directory the JPEG is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Viewport width of the requesting display; narrow viewports get a preview.
    #[arg(long)]
    viewport_width: Option<u32>,

    #[arg(long)]
    user_agent: Option<String>,
}

#[derive(Parser, Debug)]
struct CropArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 800)]
    max_width: u32,

    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Explicit crop rectangle `x,y,width,height` in source pixels.
    #[arg(long, value_parser = parse_area)]
    area: Option<CropArea>,

    /// Print a data URI instead of only writing the file.
    #[arg(long)]
    data_uri: bool,
}

#[derive(Parser, Debug)]
struct InitArgs {
    #[arg(long, value_enum, default_value_t = VariantChoice::Movie)]
    variant: VariantChoice,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct HitArgs {
    #[arg(long, value_enum, default_value_t = VariantChoice::Movie)]
    variant: VariantChoice,

    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,
}

#[derive(Parser, Debug)]
struct DropArgs {
    #[command(flatten)]
    grid: GridArgs,

    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,

    /// Image file to drop.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct PickArgs {
    #[command(flatten)]
    grid: GridArgs,

    /// Newline-delimited JSON search stream as returned by a search endpoint.
    #[arg(long)]
    stream: PathBuf,

    /// Cell that receives the chosen result. Results are only listed when omitted.
    #[arg(long)]
    cell: Option<u32>,

    /// Position of the chosen result in the list.
    #[arg(long, default_value_t = 0)]
    index: usize,
}

fn parse_area(s: &str) -> Result<CropArea, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid area '{s}': {e}"))?;
    let [x, y, width, height] = parts[..] else {
        return Err(format!("area '{s}' must be x,y,width,height"));
    };
    Ok(CropArea {
        x,
        y,
        width,
        height,
    })
}

const SYSTEM_FONTS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Export(args) => cmd_export(args),
        Command::Crop(args) => cmd_crop(args),
        Command::Init(args) => cmd_init(args),
        Command::Hit(args) => cmd_hit(args),
        Command::Drop(args) => cmd_drop(args),
        Command::Pick(args) => cmd_pick(args),
    }
}

type CliController = GridController<RecordingHost, SystemClock>;

fn open_controller(args: &GridArgs) -> anyhow::Result<CliController> {
    let variant = Variant::from(args.variant);
    let locale = Locale::normalize(&args.locale);
    let prefix = match variant {
        Variant::Movie => "movie",
        Variant::Game => "game",
    };
    let cells = JsonCellStore::new(args.store_dir.join(format!("{prefix}_cells.json")));
    let kv = JsonKeyValueStore::new(args.store_dir.join("preferences.json"));
    let prefs = Preferences::new(Box::new(kv), variant, locale);

    let mut ctl = GridController::new(
        variant,
        Box::new(cells),
        prefs,
        RecordingHost::new(),
        SystemClock,
    );
    if let Some(path) = &args.config {
        ctl = ctl.with_config(CanvasConfig::from_path(path)?)?;
    }
    let fetcher = FsFetcher::new(&args.assets);
    let loaded = ctl.load_images(&fetcher);
    tracing::info!(loaded, ?locale, "grid restored");
    Ok(ctl)
}

fn make_surface(font: Option<&Path>, width: u32, height: u32) -> anyhow::Result<CpuSurface> {
    let surface = CpuSurface::new(width, height)?;
    let path = match font {
        Some(p) => Some(p.to_path_buf()),
        None => SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.is_file()),
    };
    let Some(path) = path else {
        tracing::warn!("no font found; text will be laid out but not drawn");
        return Ok(surface);
    };
    let bytes =
        std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
    Ok(surface.with_font(bytes)?)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let ctl = open_controller(&args.grid)?;
    let (w, h) = ctl.config().pixel_size(args.scale);
    let mut surface = make_surface(args.grid.font.as_deref(), w, h)?;

    let report = prefgrid::render_grid(
        &mut surface,
        ctl.state(),
        prefgrid::FrameState::export(args.scale),
        ctl.config(),
    )?;
    let frame = surface.finish()?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let rgb = frame.to_rgb8()?;
    rgb.save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    if !report.failed_cells.is_empty() {
        eprintln!("placeholders drawn for cells {:?}", report.failed_cells);
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let ctl = open_controller(&args.grid)?;
    let (w, h) = ctl.config().pixel_size(args.scale);
    let mut surface = make_surface(args.grid.font.as_deref(), w, h)?;
    let mut exporter = Exporter::new(JpegExportEncoder).with_budget(args.budget);

    let env = EnvironmentSignal {
        viewport_width: args.viewport_width,
        user_agent: args.user_agent.clone(),
    };
    let mut delivery = match DeliveryMode::detect(&env) {
        DeliveryMode::Download => Delivery::download(&args.out_dir),
        DeliveryMode::Preview => Delivery::Preview(Box::new(|name: &str, outcome: &prefgrid::ExportOutcome| {
            println!("{name}");
            println!("{}", to_data_uri(outcome.media_type, &outcome.bytes));
            Ok(())
        })),
    };

    let (outcome, delivered) = ctl.export(&mut exporter, &mut surface, args.scale, &mut delivery)?;
    match delivered {
        Delivered::File(path) => eprintln!(
            "wrote {} ({} bytes, quality {}, {:?})",
            path.display(),
            outcome.bytes.len(),
            outcome.quality,
            outcome.status
        ),
        Delivered::Previewed { file_name } => eprintln!(
            "previewed {file_name} ({} bytes, quality {})",
            outcome.bytes.len(),
            outcome.quality
        ),
    }
    Ok(())
}

fn cmd_crop(args: CropArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let img = decode_dynamic(&bytes)?;
    let opts = CropOptions {
        max_width: Some(args.max_width),
        quality: args.quality,
        ..CropOptions::default()
    };
    let cropped = match args.area {
        Some(area) => crop_region(&img, area, opts)?,
        None => crop_to_aspect(&img, opts)?,
    };
    std::fs::write(&args.out, &cropped.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    if args.data_uri {
        println!("{}", cropped.to_data_uri());
    }
    eprintln!(
        "wrote {} ({}x{}, {} bytes)",
        args.out.display(),
        cropped.width,
        cropped.height,
        cropped.bytes.len()
    );
    Ok(())
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let config = Variant::from(args.variant).canvas_config();
    let json = serde_json::to_string_pretty(&config)?;
    std::fs::write(&args.out, json).with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_hit(args: HitArgs) -> anyhow::Result<()> {
    let config = Variant::from(args.variant).canvas_config();
    match prefgrid::hit_test(&config, args.x, args.y) {
        Some(HitTarget::MainTitle) => println!("main_title"),
        Some(HitTarget::Cell(id, region)) => {
            println!("cell {id} {}", serde_json::to_string(&region)?.trim_matches('"'))
        }
        None => println!("none"),
    }
    Ok(())
}

fn cmd_drop(args: DropArgs) -> anyhow::Result<()> {
    let mut ctl = open_controller(&args.grid)?;
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("read image '{}'", args.file.display()))?;
    let media_type = prefgrid::assets::decode::sniff_media_type(&bytes)
        .unwrap_or("application/octet-stream")
        .to_string();
    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dropped = ctl.drop_file(
        prefgrid::foundation::core::Point::new(args.x, args.y),
        Viewport::IDENTITY,
        DroppedFile {
            name,
            media_type,
            bytes,
        },
    );
    let bundle = ctl.preferences().locale().bundle();
    for call in ctl.host_mut().take() {
        if let HostCall::Notice(notice) = call {
            eprintln!("{}", bundle.notice(&notice));
        }
    }
    match dropped {
        Some(id) => {
            eprintln!("stored image in cell {id}");
            Ok(())
        }
        None => anyhow::bail!("nothing was dropped at ({}, {})", args.x, args.y),
    }
}

fn read_feed(path: &Path) -> anyhow::Result<SearchFeed> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("open search stream '{}'", path.display()))?;
    let mut decoder = LineDecoder::new();
    let mut feed = SearchFeed::new();
    let mut chunk = [0u8; 8 * 1024];
    loop {
        let n = file
            .read(&mut chunk)
            .with_context(|| format!("read search stream '{}'", path.display()))?;
        if n == 0 {
            break;
        }
        feed.apply_all(decoder.push(&chunk[..n]));
    }
    feed.apply_all(decoder.finish());
    feed.close();
    Ok(feed)
}

fn cmd_pick(args: PickArgs) -> anyhow::Result<()> {
    let feed = read_feed(&args.stream)?;
    match feed.status() {
        SearchStatus::Failed { message } => {
            anyhow::bail!("search failed: {}", message.as_deref().unwrap_or("unknown error"))
        }
        SearchStatus::NoResults { .. } => anyhow::bail!("search returned no results"),
        _ => {}
    }
    for (i, result) in feed.results().iter().enumerate() {
        let id = result.id.as_ref().map(ToString::to_string).unwrap_or_default();
        let cover = result.image.as_deref().unwrap_or("-");
        println!("{i}\t{id}\t{}\t{cover}", result.name);
    }
    if !feed.failures().is_empty() {
        eprintln!("{} item(s) failed upstream", feed.failures().len());
    }

    let Some(cell) = args.cell else {
        return Ok(());
    };
    let result = feed.results().get(args.index).with_context(|| {
        format!("no result at index {} ({} available)", args.index, feed.results().len())
    })?;
    let mut ctl = open_controller(&args.grid)?;
    let fetcher = FsFetcher::new(&args.grid.assets);
    if !ctl.select_search_result(CellId(cell), result, &fetcher) {
        anyhow::bail!("could not store result in cell {cell}");
    }
    eprintln!("stored '{}' in cell {cell}", result.name);
    Ok(())
}
