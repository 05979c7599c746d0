use anyhow::{Context, Result, bail};
use clap::Parser;
use image::GenericImageView;
use log::{LevelFilter, info};
use screenshot_palette_wasm::{
    ColorEntry, DEFAULT_GRID_DIVISOR, DEFAULT_MAX_COLORS, DecodeError, Event, ImagePreview,
    ImageSource, Sampler, WidgetState, decode::resolve_mime, decode_task, is_image_mime,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const GRID_COLUMNS: usize = 4;

/// Print the most common colors of an image as a swatch grid.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input image path
    input: PathBuf,

    /// Number of colors to keep
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_COLORS)]
    top: usize,

    /// Shorter image side is divided by this to get the sampling stride
    #[arg(short, long, default_value_t = DEFAULT_GRID_DIVISOR)]
    grid: u32,

    /// Print the palette as JSON instead of swatches
    #[arg(long)]
    json: bool,

    /// Log sampling details
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { LevelFilter::Debug } else { LevelFilter::Warn })
        .init();

    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes: Arc<[u8]> = fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?
        .into();

    let ext = args.input.extension().map(|ext| ext.to_string_lossy());
    let mime = resolve_mime(ext.as_deref(), &bytes).unwrap_or("application/octet-stream");
    if !is_image_mime(mime) {
        return Err(DecodeError::NotAnImage(mime.to_string()))
            .with_context(|| format!("{} does not look like an image", args.input.display()));
    }

    let mut state = WidgetState::new().next(Event::ImageSelected(ImageSource::new(name, mime)));
    let event = match decode_task(bytes.clone()).await {
        Ok(img) => {
            let sampler = Sampler::default().max_colors(args.top).grid_divisor(args.grid);
            let palette = sampler.extract(&img);
            info!("sampled every {}px, {} samples", palette.sample_step(), palette.samples());
            let (width, height) = img.dimensions();
            Event::ExtractionCompleted {
                preview: ImagePreview::new(bytes, width, height),
                palette,
            }
        }
        Err(e) => Event::ExtractionFailed(Arc::new(e)),
    };
    state = state.next(event);

    if let Some(err) = state.error() {
        bail!("palette extraction failed for {}: {err}", args.input.display());
    }
    let Some(palette) = state.palette() else {
        bail!("no palette produced for {}", args.input.display());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(palette.colors())?);
    } else {
        for row in palette.colors().chunks(GRID_COLUMNS) {
            let line: Vec<String> = row.iter().map(swatch).collect();
            println!("{}", line.join("  "));
        }
    }

    Ok(())
}

/// Truecolor block followed by the swatch caption.
fn swatch(entry: &ColorEntry) -> String {
    let c = entry.rgb;
    format!(
        "\x1b[48;2;{};{};{}m    \x1b[0m {} {:<18} x{:<5}",
        c.red,
        c.green,
        c.blue,
        entry.hex,
        entry.rgb_string(),
        entry.count
    )
}
