use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "stagecraft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a scene timeline document without touching a host.
    Validate(ValidateArgs),
    /// Run the compositor and dump the resulting tracks as JSON.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scene timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input scene timeline JSON. Must carry a `clips` metadata table.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Build characters in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Minimum frames between establishing camera switches.
    #[arg(long)]
    hysteresis: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let doc = stagecraft::SceneTimelineDoc::from_path(&args.in_path)
        .with_context(|| format!("loading {}", args.in_path.display()))?;
    let scene = doc.to_scene().context("resolving scene timeline")?;
    println!(
        "ok: {} characters, {} audio events, {} frames",
        scene.cast.len(),
        scene.audio.len(),
        scene.end_frame.0
    );
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let doc = stagecraft::SceneTimelineDoc::from_path(&args.in_path)
        .with_context(|| format!("loading {}", args.in_path.display()))?;
    anyhow::ensure!(
        !doc.clips.is_empty(),
        "document has no `clips` metadata table; the CLI has no other clip source"
    );
    let scene = doc.to_scene().context("resolving scene timeline")?;

    let clips = stagecraft::CachedClips::new(stagecraft::StaticClips::from_table(doc.clips.clone()));
    let mut options = stagecraft::ComposeOptions::default();
    if args.parallel {
        options.threading = stagecraft::ComposeThreading::Parallel {
            threads: args.threads,
        };
    }
    if let Some(frames) = args.hysteresis {
        options.director.switch_hysteresis_frames = frames;
    }

    let mut host = stagecraft::MemoryHost::new();
    let report = stagecraft::compose(&scene, &clips, &mut host, &options)
        .context("compositing scene")?;

    let out = serde_json::json!({
        "report": &report,
        "host": &host,
    });
    let text = serde_json::to_string_pretty(&out).context("serializing output")?;
    match args.out {
        Some(path) => {
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            println!(
                "composed {} characters, {} cuts -> {}",
                report.characters.len(),
                report.camera_cuts,
                path.display()
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}
