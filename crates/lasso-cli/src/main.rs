//! lasso: draw-to-select screen capture for search, OCR, and clipboard
//!
//! The interactive overlay is provided by a toolkit adapter implementing the
//! core's event-source contract; this binary drives the same pipeline
//! non-interactively, taking the selection region from `slurp` or an explicit
//! geometry argument, and dispatches the result to the chosen consumer.

mod consumers;
mod temp_files;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lasso_core::capture::{CaptureBackend, backend_for};
use lasso_core::detect::detect;
use lasso_core::encode::{OutputFormat, encode_selection};
use lasso_core::extract::ExtractOptions;
use lasso_core::handoff::hand_off;
use lasso_core::model::{CaptureMode, ExtractedSelection, SessionEnvironment};
use lasso_core::overlay::{Modifiers, ScriptedEvents};
use lasso_core::session::{SelectionSession, SessionOutcome};

use crate::consumers::{ClipboardConsumer, OcrConsumer, SearchConsumer};
use crate::temp_files::TempFileManager;

/// Selections larger than this on either side are downscaled before handoff
const MAX_OUTPUT_DIMENSION: u32 = 2000;

#[derive(Parser)]
#[command(name = "lasso")]
#[command(about = "Draw to select a screen region, then search, OCR, or copy it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected session environment
    Detect {
        /// Emit the environment as JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture the full screen to a file
    Capture {
        /// Output file path (format from extension)
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Select a region and dispatch it to a consumer
    Select {
        /// Request live mode (falls back to static without layer-shell)
        #[arg(long)]
        live: bool,
        /// Region as "X,Y WxH" in logical coordinates
        #[arg(long, conflicts_with = "slurp")]
        geometry: Option<String>,
        /// Pick the region interactively with slurp
        #[arg(long)]
        slurp: bool,
        /// Mask the region with an inscribed ellipse
        #[arg(long)]
        ellipse: bool,
        /// Output format: png, jpeg, or webp
        #[arg(long, default_value = "png")]
        format: String,
        /// Quality (JPEG directly, PNG compression level; ignored for WebP)
        #[arg(long, default_value_t = 80)]
        quality: u8,
        /// Gaussian feather radius for the alpha edge, in pixels
        #[arg(long, default_value_t = 0.0)]
        feather: f32,
        /// Save the selection to this path
        #[arg(long, group = "action")]
        out: Option<PathBuf>,
        /// Copy the selection to the clipboard
        #[arg(long, group = "action")]
        copy: bool,
        /// Upload the selection and open Google Lens
        #[arg(long, group = "action")]
        search: bool,
        /// Run OCR on the selection and search the text
        #[arg(long, group = "action")]
        ocr: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lasso=info".parse()?)
                .add_directive("lasso_core=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { json } => detect_command(json),
        Commands::Capture { out } => capture_command(out).await,
        Commands::Select {
            live,
            geometry,
            slurp,
            ellipse,
            format,
            quality,
            feather,
            out,
            copy,
            search,
            ocr,
        } => {
            let action = SelectAction::from_flags(out, copy, search, ocr);
            select_command(SelectArgs {
                live,
                geometry,
                slurp,
                ellipse,
                format: format.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                quality,
                feather,
                action,
            })
            .await
        }
    }
}

fn detect_command(json: bool) -> Result<()> {
    let env = detect();
    if json {
        println!("{}", serde_json::to_string_pretty(&env)?);
        return Ok(());
    }

    println!("Compositor:  {}", env.compositor);
    println!("Layer-shell: {}", if env.layer_shell { "yes" } else { "no" });
    let backends = env
        .backends
        .iter()
        .map(|b| b.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "Backends:    {}",
        if backends.is_empty() { "none" } else { &backends }
    );
    for monitor in &env.monitors {
        println!(
            "Monitor {}:   {} scale {} logical {}x{} at ({}, {})",
            monitor.id,
            monitor.name,
            monitor.scale,
            monitor.logical.width,
            monitor.logical.height,
            monitor.logical.x,
            monitor.logical.y,
        );
    }
    Ok(())
}

async fn capture_command(out: PathBuf) -> Result<()> {
    let env = detect();
    let backend = backend_for(&env).map_err(|e| {
        anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint())
    })?;

    println!("Capturing full screen via {}...", backend.kind());
    let frame = backend
        .capture_full_screen()
        .await
        .map_err(|e| anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint()))?;

    frame
        .into_image()
        .save(&out)
        .with_context(|| format!("saving {}", out.display()))?;
    println!("Saved {}", out.display());
    Ok(())
}

/// What to do with a completed selection
enum SelectAction {
    Save(PathBuf),
    Copy,
    Search,
    Ocr,
    /// No action given: save to a kept temp file and print its path
    PrintPath,
}

impl SelectAction {
    fn from_flags(out: Option<PathBuf>, copy: bool, search: bool, ocr: bool) -> Self {
        if let Some(path) = out {
            SelectAction::Save(path)
        } else if copy {
            SelectAction::Copy
        } else if search {
            SelectAction::Search
        } else if ocr {
            SelectAction::Ocr
        } else {
            SelectAction::PrintPath
        }
    }
}

struct SelectArgs {
    live:     bool,
    geometry: Option<String>,
    slurp:    bool,
    ellipse:  bool,
    format:   OutputFormat,
    quality:  u8,
    feather:  f32,
    action:   SelectAction,
}

async fn select_command(args: SelectArgs) -> Result<()> {
    if args.quality > 100 {
        bail!("quality must be between 0 and 100");
    }

    let env = detect();
    let requested = if args.live {
        CaptureMode::Live
    } else {
        CaptureMode::Static
    };

    let session = SelectionSession::new(env.clone(), requested).with_extract_options(
        ExtractOptions {
            feather:       args.feather,
            max_dimension: Some(MAX_OUTPUT_DIMENSION),
        },
    );
    if session.effective_mode().fell_back {
        consumers::notify_fallback();
    }

    // Region source: explicit geometry, or slurp for interactive picking
    let region = match (&args.geometry, args.slurp) {
        (Some(spec), _) => parse_geometry(spec)?,
        (None, true) => match run_slurp()? {
            Some(region) => region,
            None => {
                // slurp exits non-zero when the user cancels the pick
                println!("Selection cancelled.");
                return Ok(());
            }
        },
        (None, false) => bail!("pass --geometry \"X,Y WxH\" or --slurp to choose a region"),
    };

    let modifiers = if args.ellipse {
        Modifiers::ctrl_shift()
    } else {
        Modifiers::ctrl()
    };
    let (x, y, w, h) = region;
    let events = ScriptedEvents::drag(
        &[(x, y), (x + w, y + h)],
        modifiers,
        logical_size(&env),
    );

    let backend = backend_for(&env)
        .map_err(|e| anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint()))?;

    let outcome = session
        .run(events, backend.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("{e}\nhint: {}", e.remediation_hint()))?;

    let selection = match outcome {
        SessionOutcome::Completed(selection) => selection,
        SessionOutcome::Cancelled => {
            println!("Selection cancelled.");
            return Ok(());
        }
    };

    dispatch(selection, &args)
}

fn dispatch(selection: ExtractedSelection, args: &SelectArgs) -> Result<()> {
    let files = TempFileManager::new()?;

    match &args.action {
        SelectAction::Save(path) => {
            let bytes = encode_selection(&selection, args.format, args.quality)?;
            std::fs::write(path, bytes).with_context(|| format!("saving {}", path.display()))?;
            println!("Saved {}", path.display());
        }
        SelectAction::Copy => {
            hand_off(
                selection,
                &ClipboardConsumer {
                    format:  args.format,
                    quality: args.quality,
                },
            )?;
            println!("Selection copied to clipboard.");
        }
        SelectAction::Search => {
            let upload_path = files.persistent_path("upload", "png");
            hand_off(selection, &SearchConsumer { upload_path })?;
            println!("Opening image search...");
        }
        SelectAction::Ocr => {
            let image_path = files.persistent_path("ocr", "png");
            hand_off(selection, &OcrConsumer { image_path })?;
            println!("Running OCR...");
        }
        SelectAction::PrintPath => {
            let bytes = encode_selection(&selection, args.format, args.quality)?;
            let path = files.write("selection", args.format.extension(), &bytes)?;
            files.keep(&path);
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Overall logical size of the layout, for whole-surface selections
fn logical_size(env: &SessionEnvironment) -> (f64, f64) {
    let mut width: f64 = 0.0;
    let mut height: f64 = 0.0;
    for monitor in &env.monitors {
        width = width.max(monitor.logical.x + monitor.logical.width);
        height = height.max(monitor.logical.y + monitor.logical.height);
    }
    (width, height)
}

/// Parses "X,Y WxH" (slurp's output format) into (x, y, w, h)
fn parse_geometry(spec: &str) -> Result<(f64, f64, f64, f64)> {
    let parse = || -> Option<(f64, f64, f64, f64)> {
        let (origin, size) = spec.trim().split_once(' ')?;
        let (x, y) = origin.split_once(',')?;
        let (w, h) = size.split_once('x')?;
        Some((
            x.trim().parse().ok()?,
            y.trim().parse().ok()?,
            w.trim().parse().ok()?,
            h.trim().parse().ok()?,
        ))
    };
    let region = parse()
        .with_context(|| format!("invalid geometry '{spec}', expected \"X,Y WxH\""))?;
    if region.2 <= 0.0 || region.3 <= 0.0 {
        bail!("geometry size must be positive, got '{spec}'");
    }
    Ok(region)
}

/// Runs slurp for an interactive region pick. `Ok(None)` means the user
/// cancelled.
fn run_slurp() -> Result<Option<(f64, f64, f64, f64)>> {
    let output = std::process::Command::new("slurp")
        .output()
        .context("failed to run slurp; install it or pass --geometry")?;
    if !output.status.success() {
        return Ok(None);
    }
    let spec = String::from_utf8_lossy(&output.stdout);
    parse_geometry(spec.trim()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geometry() {
        assert_eq!(parse_geometry("10,20 300x200").unwrap(), (10.0, 20.0, 300.0, 200.0));
        assert_eq!(parse_geometry(" -5,0 10x10 ").unwrap(), (-5.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_parse_geometry_rejects_malformed() {
        assert!(parse_geometry("10,20").is_err());
        assert!(parse_geometry("10 20 300x200").is_err());
        assert!(parse_geometry("a,b cxd").is_err());
        assert!(parse_geometry("10,20 0x200").is_err());
        assert!(parse_geometry("10,20 300x-1").is_err());
    }

    #[test]
    fn test_logical_size_spans_layout() {
        use lasso_core::model::{
            Compositor, LogicalRect, Monitor, PhysicalRect,
        };
        let env = SessionEnvironment {
            compositor:  Compositor::Sway,
            backends:    vec![],
            layer_shell: true,
            monitors:    vec![
                Monitor {
                    id:       0,
                    name:     "A".to_string(),
                    scale:    1.0,
                    logical:  LogicalRect::new(0.0, 0.0, 1920.0, 1080.0),
                    physical: PhysicalRect::new(0, 0, 1920, 1080),
                },
                Monitor {
                    id:       1,
                    name:     "B".to_string(),
                    scale:    1.0,
                    logical:  LogicalRect::new(1920.0, 0.0, 1280.0, 1024.0),
                    physical: PhysicalRect::new(1920, 0, 1280, 1024),
                },
            ],
        };
        assert_eq!(logical_size(&env), (3200.0, 1080.0));
    }
}
