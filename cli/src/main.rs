//! mixcast command-line entry point.
//!
//! Builds an engine, registers the built-in sources, creates scenes from a
//! JSON description (or a default scene), streams for a bounded duration,
//! and shuts everything down.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::{debug, info, warn};

use mixcast_core::{EngineEvent, StreamSettings};
use mixcast_engine::create_engine;
use mixcast_sources::{
    create_color_source, create_tone_source, COLOR_SOURCE_ID, TONE_SOURCE_ID,
};

#[derive(Parser)]
#[command(
    name = "mixcast",
    about = "Real-time scene-compositing stream engine",
    version
)]
struct Cli {
    /// Stream for this many seconds, then stop (0 skips streaming).
    #[arg(long, default_value = "5")]
    duration: u64,

    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Tick rate in frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// JSON scene description file.
    #[arg(long)]
    scenes: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

/// One scene in a `--scenes` description file.
#[derive(Debug, Deserialize)]
struct SceneDescription {
    name: String,
    sources: Vec<SourceDescription>,
}

/// One source entry: a registered factory id plus an instance name.
#[derive(Debug, Deserialize)]
struct SourceDescription {
    id: String,
    name: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = StreamSettings::default();
    if let Some(width) = cli.width {
        settings.video.width = width;
    }
    if let Some(height) = cli.height {
        settings.video.height = height;
    }
    if let Some(fps) = cli.fps {
        settings.video.fps = fps;
    }

    let (mut engine, events) = create_engine(settings);
    engine.register_source(COLOR_SOURCE_ID, create_color_source);
    engine.register_source(TONE_SOURCE_ID, create_tone_source);
    engine
        .initialize()
        .context("engine initialization failed")?;

    let descriptions = match &cli.scenes {
        Some(path) => load_scenes(path)?,
        None => default_scenes(),
    };

    for description in &descriptions {
        let scene = engine.create_scene(&description.name);
        scene
            .initialize()
            .with_context(|| format!("scene '{}' failed to initialize", description.name))?;

        for entry in &description.sources {
            let Some(source) = engine.create_source(&entry.id, &entry.name) else {
                warn!(id = %entry.id, name = %entry.name, "unknown source id, skipping");
                continue;
            };
            source
                .lock()
                .initialize()
                .with_context(|| format!("source '{}' failed to initialize", entry.name))?;
            source.lock().start();
            scene.add_source(&source);
        }

        info!(
            scene = %description.name,
            sources = scene.source_count(),
            "scene ready"
        );
    }

    // Drain engine events on a helper thread so the bounded channel never
    // backs up; it ends when the engine (the last sender) is dropped.
    let event_thread = thread::spawn(move || {
        for event in events.iter() {
            match event {
                EngineEvent::Metrics(m) => {
                    info!(ticks = m.ticks, rate = m.tick_rate, "stream metrics")
                }
                other => debug!(event = ?other, "engine event"),
            }
        }
    });

    if cli.duration > 0 {
        if !engine.start_streaming() {
            bail!("engine refused to start streaming");
        }
        info!(seconds = cli.duration, "streaming");
        thread::sleep(Duration::from_secs(cli.duration));
        engine.stop_streaming();

        let metrics = engine.metrics();
        info!(
            ticks = metrics.ticks,
            late = metrics.late_ticks,
            video = metrics.video_frames,
            audio = metrics.audio_frames,
            "session summary"
        );
    }

    engine.shutdown();
    drop(engine);
    let _ = event_thread.join();
    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();
}

fn load_scenes(path: &Path) -> Result<Vec<SceneDescription>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading scene description {}", path.display()))?;
    let descriptions: Vec<SceneDescription> = serde_json::from_str(&text)
        .with_context(|| format!("parsing scene description {}", path.display()))?;
    if descriptions.is_empty() {
        bail!("scene description {} defines no scenes", path.display());
    }
    Ok(descriptions)
}

fn default_scenes() -> Vec<SceneDescription> {
    vec![SceneDescription {
        name: "main".to_string(),
        sources: vec![
            SourceDescription {
                id: COLOR_SOURCE_ID.to_string(),
                name: "Background".to_string(),
            },
            SourceDescription {
                id: TONE_SOURCE_ID.to_string(),
                name: "Bed".to_string(),
            },
        ],
    }]
}
