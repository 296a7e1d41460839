//! Slidemark command-line entry point.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use kurbo::{Point, Size};
use serde_json::json;
use slidemark_core::storage::{
    FileStorage, SaveReport, TutorialStore, load_tutorial, slide_prefix,
};
use slidemark_core::{AnnotationKind, AnnotatorConfig, EditorSession, KeyInput, Tool, Tutorial};
use slidemark_render::SkiaPainter;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "slidemark",
    version,
    about = "Annotate captured application screenshots into step-by-step tutorials"
)]
struct Cli {
    /// Settings file (defaults to the per-user location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding Raw/ captures and Annotations/ output
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Locale of the text dictionary to read
    #[arg(long, global = true)]
    locale: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a tutorial from Raw/Tutorial.json and save it
    Import,
    /// Redraw every exported slide and write the images
    Render(RenderArgs),
    /// Print a JSON summary of the saved tutorial
    Inspect,
    /// Place one annotation the way the editor does, then save
    Annotate(AnnotateArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output directory (defaults to Annotations/)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Fit images inside this width
    #[arg(long, requires = "height")]
    width: Option<u32>,
    /// Fit images inside this height
    #[arg(long, requires = "width")]
    height: Option<u32>,
}

#[derive(Args, Debug)]
struct AnnotateArgs {
    /// Slide index
    #[arg(long)]
    slide: usize,
    /// Arrow, ArrowText, Rectangle, Circle, TextBox or Click
    #[arg(long, value_parser = parse_kind)]
    kind: AnnotationKind,
    /// Pointer position in image pixels, as "x,y"
    #[arg(long, value_parser = parse_point)]
    at: Point,
    /// Steps back from the front-most widget under the pointer
    #[arg(long, default_value_t = 0)]
    depth: usize,
    /// Text for kinds that carry text
    #[arg(long)]
    text: Option<String>,
}

fn parse_kind(value: &str) -> Result<AnnotationKind, String> {
    AnnotationKind::from_name(value).map_err(|e| e.to_string())
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {value:?}"))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Point::new(x, y))
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::info!("Using output directory {}", config.output_dir.display());

    match cli.command {
        Commands::Import => command_import(&config),
        Commands::Render(args) => command_render(&config, args),
        Commands::Inspect => command_inspect(&config),
        Commands::Annotate(args) => command_annotate(&config, args),
    }
}

fn load_config(cli: &Cli) -> Result<AnnotatorConfig> {
    let mut config = match cli.config.clone().or_else(AnnotatorConfig::default_path) {
        Some(path) => AnnotatorConfig::load(&path)
            .with_context(|| format!("failed to read settings: {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if cli.locale.is_some() {
        config.locale = cli.locale.clone();
    }
    Ok(config)
}

fn open_storage(config: &AnnotatorConfig) -> Result<FileStorage> {
    FileStorage::from_config(config).with_context(|| {
        format!("failed to open output directory: {}", config.output_dir.display())
    })
}

fn print_report(report: SaveReport) -> Result<()> {
    let summary = json!({
        "slides": report.slides,
        "text_entries": report.text_entries,
        "images": report.images,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn command_import(config: &AnnotatorConfig) -> Result<()> {
    let mut store = TutorialStore::new(open_storage(config)?).with_locale(config.locale.clone());
    let slides = store
        .import_capture()
        .context("failed to import capture session")?
        .len();
    for warning in store.warnings() {
        eprintln!("warning: {warning}");
    }
    if slides == 0 {
        bail!("capture session produced no slides");
    }

    let mut painter = SkiaPainter::new(config.geometry.clone());
    let report = store
        .save(Some(&mut painter))
        .context("failed to save tutorial")?;
    print_report(report)
}

fn command_render(config: &AnnotatorConfig, args: RenderArgs) -> Result<()> {
    let storage = open_storage(config)?;
    let out = args.out.unwrap_or_else(|| storage.annotations_dir());
    fs::create_dir_all(&out)
        .with_context(|| format!("failed to create output dir: {}", out.display()))?;

    let mut tutorial = load_tutorial(&storage, config.locale.as_deref())
        .context("failed to load tutorial")?
        .tutorial;
    let mut painter = SkiaPainter::new(config.geometry.clone());
    let target = args
        .width
        .zip(args.height)
        .map(|(w, h)| Size::new(w as f64, h as f64));

    let mut written = 0;
    for (index, slide) in tutorial.slides_mut().iter_mut().enumerate() {
        if !slide.is_emitted() {
            continue;
        }
        slide.redraw(&mut painter);
        let image = match target {
            Some(size) => slide.resized_output(size, true),
            None => slide.resized_output(slide.image_size(), false),
        };
        let path = out.join(format!("{}.png", slide_prefix(index, &slide.title)));
        image
            .save(&path)
            .with_context(|| format!("failed to save slide image: {}", path.display()))?;
        log::debug!("Wrote {}", path.display());
        written += 1;
    }
    println!("{}", json!({ "images": written, "out": out.display().to_string() }));
    Ok(())
}

fn summarize(tutorial: &Tutorial) -> serde_json::Value {
    let slides: Vec<_> = tutorial
        .slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| {
            let annotations: Vec<_> = slide
                .annotations()
                .iter()
                .map(|a| {
                    json!({
                        "kind": a.kind().name(),
                        "widgetPath": a.target().path,
                        "text": a.text,
                    })
                })
                .collect();
            json!({
                "index": index,
                "layout": slide.layout.name(),
                "title": slide.title,
                "size": [slide.background().width(), slide.background().height()],
                "widgets": slide.widgets.len(),
                "sources": slide.screenshot_sources,
                "annotations": annotations,
            })
        })
        .collect();
    json!({
        "title": tutorial.metadata.title,
        "author": tutorial.metadata.author,
        "version": tutorial.metadata.format_version,
        "slides": slides,
    })
}

fn command_inspect(config: &AnnotatorConfig) -> Result<()> {
    let storage = open_storage(config)?;
    let outcome =
        load_tutorial(&storage, config.locale.as_deref()).context("failed to load tutorial")?;
    let mut summary = summarize(&outcome.tutorial);
    summary["warnings"] = json!(
        outcome
            .warnings
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn command_annotate(config: &AnnotatorConfig, args: AnnotateArgs) -> Result<()> {
    let mut store = TutorialStore::new(open_storage(config)?).with_locale(config.locale.clone());
    store.load().context("failed to load tutorial")?;

    let (id, target) = {
        let tutorial = store.edit()?;
        let slide = tutorial
            .slide_mut(args.slide)
            .with_context(|| format!("no slide {}", args.slide))?;

        // The view shows the slide at its own size.
        let mut session = EditorSession::new(config);
        session.set_display_size(slide.image_size());
        session.set_tool(slide, Tool::Place(args.kind));
        for _ in 0..args.depth {
            session.step_depth(slide, 1);
        }
        session.pointer_moved(slide, args.at);
        let Some(id) = session.pointer_pressed(slide, args.at) else {
            bail!("no widget at {},{}", args.at.x, args.at.y);
        };
        if let Some(text) = args.text {
            session.key(slide, KeyInput::Paste(text));
        }
        let target = slide
            .annotation(id)
            .map(|a| a.target().path.clone())
            .unwrap_or_default();
        session.finish_current(slide);
        (id, target)
    };

    let mut painter = SkiaPainter::new(config.geometry.clone());
    let report = store
        .save(Some(&mut painter))
        .context("failed to save tutorial")?;
    log::info!("Added {} annotation {id} on {target}", args.kind);
    print_report(report)
}
