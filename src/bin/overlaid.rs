use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use overlaid::{
    EngineConfig, MediaKind, MediaSource, OverlayEngine, OverlayRequest, OverlayScale,
    SpatialAnchor,
};

#[derive(Parser, Debug)]
#[command(name = "overlaid", version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the overlay onto one input.
    Apply(ApplyArgs),
    /// Composite the overlay onto many inputs concurrently.
    Batch(BatchArgs),
    /// Decode an input and print what the engine sees.
    Probe(ProbeArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Overlay asset (animated image or video).
    #[arg(long)]
    overlay: PathBuf,

    /// Overlay kind; inferred from the extension when omitted.
    #[arg(long)]
    overlay_kind: Option<MediaKind>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overlay speed factor in [0.1, 3.0].
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Overlay anchor: top-left, top-right, bottom-left, bottom-right, center or `x,y`.
    #[arg(long)]
    anchor: Option<SpatialAnchor>,

    /// Output duration cap in seconds for video and animated inputs.
    #[arg(long)]
    max_duration: Option<f64>,

    /// Overlay scale: native, factor:<f> or fit-short-side:<fraction>.
    #[arg(long)]
    scale: Option<OverlayScale>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Base input.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Base kind; inferred from the extension when omitted.
    #[arg(long)]
    kind: Option<MediaKind>,

    /// Output path. The artifact's extension is appended when it has none.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Directory receiving `<input stem>.<ext>` outputs.
    #[arg(long)]
    out_dir: PathBuf,

    /// Worker threads. Defaults to the number of CPUs.
    #[arg(long)]
    jobs: Option<usize>,

    /// Base inputs; kinds are inferred from extensions.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Input to decode.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Input kind; inferred from the extension when omitted.
    #[arg(long)]
    kind: Option<MediaKind>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Apply(args) => cmd_apply(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn kind_for(path: &Path, explicit: Option<MediaKind>) -> anyhow::Result<MediaKind> {
    if let Some(kind) = explicit {
        return Ok(kind);
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    MediaKind::from_extension(ext).with_context(|| {
        format!(
            "cannot infer media kind of '{}' from its extension; pass --kind",
            path.display()
        )
    })
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read input '{}'", path.display()))
}

fn build_engine(args: &EngineArgs) -> anyhow::Result<OverlayEngine> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            EngineConfig::from_json_str(&text)
                .with_context(|| format!("load config '{}'", path.display()))?
        }
        None => EngineConfig::default(),
    };

    let kind = kind_for(&args.overlay, args.overlay_kind)?;
    let bytes = read_input(&args.overlay)?;
    let engine = OverlayEngine::from_overlay_bytes(&bytes, kind, config)
        .with_context(|| format!("load overlay '{}'", args.overlay.display()))?;
    Ok(engine)
}

fn request<'a>(args: &EngineArgs, bytes: &'a [u8], kind: MediaKind) -> OverlayRequest<'a> {
    let mut req = OverlayRequest::new(bytes, kind).speed(args.speed);
    if let Some(anchor) = args.anchor {
        req = req.anchor(anchor);
    }
    if let Some(secs) = args.max_duration {
        req = req.max_duration_secs(secs);
    }
    if let Some(scale) = args.scale {
        req = req.scale(scale);
    }
    req
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write output '{}'", path.display()))
}

fn cmd_apply(args: ApplyArgs) -> anyhow::Result<()> {
    let engine = build_engine(&args.engine)?;
    let kind = kind_for(&args.in_path, args.kind)?;
    let bytes = read_input(&args.in_path)?;

    let artifact = engine
        .run(&request(&args.engine, &bytes, kind))
        .with_context(|| format!("process '{}'", args.in_path.display()))?;

    let out = if args.out.extension().is_none() {
        args.out.with_extension(artifact.format.extension())
    } else {
        args.out
    };
    write_output(&out, &artifact.bytes)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    use rayon::prelude::*;

    let engine = build_engine(&args.engine)?;
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        anyhow::ensure!(jobs > 0, "--jobs must be > 0");
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build().context("build worker pool")?;

    let stems = output_stems(&args.inputs);
    let results: Vec<(PathBuf, anyhow::Result<PathBuf>)> = pool.install(|| {
        args.inputs
            .par_iter()
            .zip(stems.par_iter())
            .map(|(input, stem)| {
                let res = process_one(&engine, &args.engine, input, &args.out_dir, stem);
                (input.clone(), res)
            })
            .collect()
    });

    let mut failed = 0usize;
    for (input, res) in results {
        match res {
            Ok(out) => eprintln!("wrote {}", out.display()),
            Err(err) => {
                failed += 1;
                eprintln!("failed {}: {err:#}", input.display());
            }
        }
    }
    anyhow::ensure!(
        failed == 0,
        "{failed} of {} inputs failed",
        args.inputs.len()
    );
    Ok(())
}

/// Output file stems for a batch. Inputs sharing a stem get `<stem>-<n>`, `n` being their 1-based
/// position on the command line.
fn output_stems(inputs: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = inputs
        .iter()
        .map(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_owned())
        })
        .collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }
    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            if counts.get(stem.as_str()).copied().unwrap_or(0) > 1 {
                format!("{stem}-{}", i + 1)
            } else {
                stem.clone()
            }
        })
        .collect()
}

fn process_one(
    engine: &OverlayEngine,
    engine_args: &EngineArgs,
    input: &Path,
    out_dir: &Path,
    stem: &str,
) -> anyhow::Result<PathBuf> {
    let kind = kind_for(input, None)?;
    let bytes = read_input(input)?;
    let artifact = engine.run(&request(engine_args, &bytes, kind))?;
    let out = out_dir.join(format!("{stem}.{}", artifact.format.extension()));
    write_output(&out, &artifact.bytes)?;
    Ok(out)
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let kind = kind_for(&args.in_path, args.kind)?;
    let bytes = read_input(&args.in_path)?;
    let source = overlaid::decode(&bytes, kind)
        .with_context(|| format!("decode '{}'", args.in_path.display()))?;

    println!("kind: {}", kind.as_str());
    println!("dimensions: {}", source.dimensions());
    println!("frames: {}", source.frame_count());
    match &source {
        MediaSource::Sequence(seq) => {
            println!("fps: {}", seq.fps());
            println!("duration: {}", seq.duration());
        }
        MediaSource::Still(_) => println!("still: true"),
    }
    Ok(())
}
