//! reviewdiff - render a diff the way a code review page shows it
//!
//! Usage: reviewdiff [options] <diff-file>
//!
//! The input is either a JSON diff payload (`{"content": [...]}`) or a
//! unified diff. The rendered table is written to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use log::{debug, info};

use reviewdiff::config::{load_prefs, load_prefs_from_path};
use reviewdiff::diff::UnifiedDiff;
use reviewdiff::layer::{CoverageLayer, CoverageRange, SyntaxLayer};
use reviewdiff::{
    ChunkProcessor, Context, DiffInfo, DiffPrefs, DiffRenderer, LayerPipeline, ProcessOutcome,
    ThreadScheduler, ViewMode,
};

struct CliArgs {
    input: PathBuf,
    prefs: Option<PathBuf>,
    context: Option<i64>,
    path: Option<String>,
    coverage: Option<PathBuf>,
    unified: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let mut prefs = match &args.prefs {
        Some(path) => load_prefs_from_path(path)?
            .with_context(|| format!("Prefs file not found: {}", path.display()))?,
        None => load_prefs()?.unwrap_or_default(),
    };
    if let Some(context) = args.context {
        prefs.context = Context::from_value(context);
    }
    if let Err(err) = prefs.validate() {
        eprintln!("reviewdiff: {err}");
        std::process::exit(2);
    }

    let (info, path_from_diff) = read_diff(&args.input)?;
    let path = args.path.or(path_from_diff);

    let mut pipeline = LayerPipeline::standard(&prefs)?;
    if let Some(path) = &path {
        if let Some(syntax) = pipeline.layer_mut::<SyntaxLayer>() {
            let highlighted = syntax
                .process(path, &info)
                .with_context(|| format!("Failed to highlight {path}"))?;
            debug!("syntax highlighting for {path}: {highlighted}");
        }
    }
    if let Some(coverage_path) = &args.coverage {
        let ranges = read_coverage(coverage_path)?;
        for layer in pipeline.layers_mut::<CoverageLayer>() {
            layer.set_ranges(&ranges);
        }
    }
    // nothing is rendered yet, so earlier re-render requests are moot
    let _ = pipeline.drain_events();

    let mode = if args.unified {
        ViewMode::Unified
    } else {
        ViewMode::SideBySide
    };
    let renderer = render(&prefs, &info, mode, pipeline)?;
    print!("{}", renderer.to_markup());
    Ok(())
}

fn render(
    prefs: &DiffPrefs,
    info: &DiffInfo,
    mode: ViewMode,
    pipeline: LayerPipeline,
) -> Result<DiffRenderer> {
    let mut renderer = DiffRenderer::from_prefs(mode, pipeline, prefs)?;
    let mut processor = ChunkProcessor::from_prefs(prefs)?;
    let task = processor.process(info, &mut renderer)?;
    match task.run(&mut renderer, &mut ThreadScheduler) {
        ProcessOutcome::Completed => {
            info!("rendered {} groups", renderer.groups().len());
        }
        ProcessOutcome::Canceled => debug!("diff processing was canceled"),
    }
    Ok(renderer)
}

/// Read a JSON diff payload or a unified diff. Unified diffs also name the
/// file, which is used for syntax highlighting.
fn read_diff(path: &Path) -> Result<(DiffInfo, Option<String>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read diff: {}", path.display()))?;

    if text.trim_start().starts_with('{') {
        let info: DiffInfo = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse diff JSON: {}", path.display()))?;
        return Ok((info, None));
    }

    let diff = UnifiedDiff::parse(&text);
    if diff.hunks.is_empty() {
        anyhow::bail!("No hunks found in {}", path.display());
    }
    let file = diff.file_b.clone().or_else(|| diff.file_a.clone());
    Ok((diff.to_diff_info(None), file))
}

fn read_coverage(path: &Path) -> Result<Vec<CoverageRange>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read coverage: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse coverage: {}", path.display()))
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut input: Option<PathBuf> = None;
    let mut prefs: Option<PathBuf> = None;
    let mut context: Option<i64> = None;
    let mut path: Option<String> = None;
    let mut coverage: Option<PathBuf> = None;
    let mut unified = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("Usage: reviewdiff [options] <diff-file>");
                println!();
                println!("Options:");
                println!("  --context <n>      Lines of context, -1 for the whole file");
                println!("  --prefs <path>     Diff preferences JSON");
                println!("  --path <file>      File name used to pick syntax highlighting");
                println!("  --coverage <path>  Coverage ranges JSON");
                println!("  --unified          Unified instead of side-by-side rows");
                println!();
                println!("Environment:");
                println!("  RUST_LOG           Log filter, e.g. reviewdiff=debug");
                std::process::exit(0);
            }
            "--context" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--context requires a number"))?;
                context = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid context: {value}"))?,
                );
            }
            "--prefs" => {
                i += 1;
                if i >= args.len() {
                    anyhow::bail!("--prefs requires a path");
                }
                prefs = Some(PathBuf::from(&args[i]));
            }
            "--path" => {
                i += 1;
                if i >= args.len() {
                    anyhow::bail!("--path requires a file name");
                }
                path = Some(args[i].clone());
            }
            "--coverage" => {
                i += 1;
                if i >= args.len() {
                    anyhow::bail!("--coverage requires a path");
                }
                coverage = Some(PathBuf::from(&args[i]));
            }
            "--unified" => unified = true,
            arg if arg.starts_with('-') => {
                anyhow::bail!("Unknown option: {arg}");
            }
            arg => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    anyhow::bail!("Unexpected argument: {arg}");
                }
            }
        }
        i += 1;
    }

    let input = input.context("Missing diff file (see --help)")?;
    Ok(CliArgs {
        input,
        prefs,
        context,
        path,
        coverage,
        unified,
    })
}
