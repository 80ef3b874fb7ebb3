use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_engine::{default_engine, OpenSource, PdfEngine, PdfPages, RasterContext};
use pdfshow_core::{OverlayConfig, PageRenderer, PaintOutcome, Scale, Session, ViewportSize};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "pdfshow-cli")]
#[command(about = "Annotate PDF pages with overlay shapes")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Replay an annotation script and paint the resulting page.
    Annotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON list of actions
        #[arg(long)]
        script: PathBuf,
        /// Viewport width in pixels (defaults to the first page width)
        #[arg(long)]
        width: Option<u32>,
        /// Viewport height in pixels (defaults to the first page height)
        #[arg(long)]
        height: Option<u32>,
        /// PNG to paint the current page into
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overlay config file; PDFSHOW_* variables are used otherwise
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct AnnotateOutput {
    page_count: usize,
    current_page: usize,
    shapes_per_page: Vec<usize>,
    scale: Scale,
}

/// One step of an annotation script
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Action {
    Next,
    Prev,
    Goto { page: usize },
    InsertPage,
    Text { x: i32, y: i32, text: String },
    Line { x: i32, y: i32, end_x: i32, end_y: i32 },
    Marker { x: i32, y: i32, end_x: i32, end_y: i32 },
    Rectangle { x: i32, y: i32, corner_x: i32, corner_y: i32 },
    Polyline { x: i32, y: i32, points: Vec<[i32; 2]> },
    /// Rubber-band a shape: append once, then replace it for each path point
    Drag { kind: DragKind, x: i32, y: i32, path: Vec<[i32; 2]> },
    RemoveLast,
    RemoveAt { index: usize },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DragKind {
    Line,
    Marker,
    Rectangle,
    Polyline,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Annotate { file, script, width, height, output, config } => {
            run_annotate(&AnnotateArgs {
                file: &file,
                script: &script,
                width,
                height,
                output: output.as_deref(),
                config: config.as_deref(),
            })
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width, height: size.height })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

struct AnnotateArgs<'a> {
    file: &'a Path,
    script: &'a Path,
    width: Option<u32>,
    height: Option<u32>,
    output: Option<&'a Path>,
    config: Option<&'a Path>,
}

fn run_annotate(args: &AnnotateArgs<'_>) -> Result<()> {
    ensure_pdf_exists(args.file)?;

    let script = fs::read_to_string(args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let actions: Vec<Action> = serde_json::from_str(&script).context("invalid annotation script")?;

    let config = match args.config {
        Some(path) => OverlayConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => OverlayConfig::from_env().context("invalid PDFSHOW_* environment")?,
    };

    let pages = PdfPages::open(args.file).context("failed to open PDF")?;
    let first = pages.intrinsic_bbox(0)?;
    let viewport = ViewportSize::new(
        args.width.unwrap_or(first.width.round() as u32).max(1),
        args.height.unwrap_or(first.height.round() as u32).max(1),
    );

    let mut session = Session::with_config(pages, viewport, config.clone())?;
    session.on_page_changed(|change| {
        log::info!("page {} -> {} of {}", change.previous, change.current, change.page_count)
    });

    for (step, action) in actions.iter().enumerate() {
        apply(&mut session, &config, action)
            .with_context(|| format!("script step {step} failed"))?;
    }

    let mut ctx = RasterContext::new(viewport.width, viewport.height);
    if let PaintOutcome::Failed { message } = session.render(&mut ctx) {
        anyhow::bail!(message);
    }

    if let Some(output) = args.output {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        ctx.into_image()
            .save(output)
            .with_context(|| format!("failed to write image to {}", output.display()))?;
    }

    let payload = AnnotateOutput {
        page_count: session.page_count(),
        current_page: session.current_page(),
        shapes_per_page: session.document().stores().iter().map(|store| store.len()).collect(),
        scale: session.scale(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    session.close()?;
    Ok(())
}

fn apply<R: PageRenderer>(
    session: &mut Session<R>,
    config: &OverlayConfig,
    action: &Action,
) -> Result<()> {
    match action {
        Action::Next => {
            session.goto_next();
        }
        Action::Prev => {
            session.goto_prev();
        }
        Action::Goto { page } => {
            if !session.set_page_number(*page) {
                anyhow::bail!("page {page} out of range (page_count={})", session.page_count());
            }
        }
        Action::InsertPage => {
            session.insert_new_page()?;
        }
        Action::Text { x, y, text } => {
            session.add_shape(config.text_shape(*x, *y, text.as_str()));
        }
        Action::Line { x, y, end_x, end_y } => {
            session.add_shape(config.line_shape(*x, *y, *end_x, *end_y));
        }
        Action::Marker { x, y, end_x, end_y } => {
            session.add_shape(config.marker_shape(*x, *y, *end_x, *end_y));
        }
        Action::Rectangle { x, y, corner_x, corner_y } => {
            session.add_shape(config.rectangle_shape(*x, *y, *corner_x, *corner_y));
        }
        Action::Polyline { x, y, points } => {
            let mut shape = config.polyline_shape(*x, *y)?;
            if let Some(line) = shape.as_polyline_mut() {
                for [px, py] in points {
                    line.add_point(*px, *py)?;
                }
            }
            session.add_shape(shape);
        }
        Action::Drag { kind, x, y, path } => drag(session, config, *kind, *x, *y, path)?,
        Action::RemoveLast => {
            session.remove_last_shape();
        }
        Action::RemoveAt { index } => {
            session.remove_shape_at(*index)?;
        }
        Action::Clear => session.clear_page(),
    }

    Ok(())
}

fn drag<R: PageRenderer>(
    session: &mut Session<R>,
    config: &OverlayConfig,
    kind: DragKind,
    x: i32,
    y: i32,
    path: &[[i32; 2]],
) -> Result<()> {
    if kind == DragKind::Polyline {
        let mut shape = config.polyline_shape(x, y)?;
        let index = session.add_shape(shape.clone());
        for [px, py] in path {
            if let Some(line) = shape.as_polyline_mut() {
                line.add_point(*px, *py)?;
            }
            session.replace_shape(index, shape.clone())?;
        }
        return Ok(());
    }

    let shape_to = |cx: i32, cy: i32| match kind {
        DragKind::Marker => config.marker_shape(x, y, cx, cy),
        DragKind::Rectangle => config.rectangle_shape(x, y, cx, cy),
        _ => config.line_shape(x, y, cx, cy),
    };

    let index = session.add_shape(shape_to(x, y));
    for [cx, cy] in path {
        session.replace_shape(index, shape_to(*cx, *cy))?;
    }
    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_actions() {
        let actions: Vec<Action> = serde_json::from_str(
            r#"[
                {"action": "next"},
                {"action": "goto", "page": 2},
                {"action": "text", "x": 1, "y": 2, "text": "hi"},
                {"action": "drag", "kind": "rectangle", "x": 0, "y": 0, "path": [[5, 5]]},
                {"action": "remove_at", "index": 0}
            ]"#,
        )
        .expect("script should parse");

        assert_eq!(actions[0], Action::Next);
        assert_eq!(actions[1], Action::Goto { page: 2 });
        assert_eq!(
            actions[3],
            Action::Drag { kind: DragKind::Rectangle, x: 0, y: 0, path: vec![[5, 5]] }
        );
        assert_eq!(actions[4], Action::RemoveAt { index: 0 });
    }

    #[test]
    fn rejects_unknown_action() {
        let result: Result<Vec<Action>, _> = serde_json::from_str(r#"[{"action": "erase"}]"#);
        assert!(result.is_err());
    }
}
