//! Reel - headless pipeline renderer
//!
//! Builds a two-track demo graph (two colour producers under a transition,
//! driven by a tractor) and renders frames through the threaded consumer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use reel_consumer::Consumer;
use reel_core::{Context, ImageFormat, Profile};
use reel_effects::{EffectName, LumaMap, Transition};
use reel_media::{Multitrack, Producer, Tractor};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "reel", version, about = "Render a demo transition headlessly")]
struct Args {
    /// Profile JSON file (defaults to 720x576 at 25 fps)
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Number of frames to render
    #[arg(short = 'n', long, default_value_t = 50)]
    frames: usize,

    /// Transition effect: switch, mix, composite or luma
    #[arg(short, long, default_value = "luma")]
    transition: EffectName,

    /// First frame of the transition window
    #[arg(long = "in", default_value_t = 10.0)]
    window_in: f64,

    /// Frame after the last one of the transition window
    #[arg(long = "out", default_value_t = 40.0)]
    window_out: f64,

    /// Colour of the A track
    #[arg(long, default_value = "red")]
    a: String,

    /// Colour of the B track
    #[arg(long, default_value = "blue")]
    b: String,

    /// Binary PGM luma map for the luma wipe
    #[arg(long)]
    luma: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let profile = match &args.profile {
        Some(path) => Profile::load_from_file(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => Profile::default(),
    };
    info!(
        width = profile.width,
        height = profile.height,
        fps = profile.fps,
        "Reel starting"
    );
    let context = Context::new(profile);

    let tractor = build_graph(&context, &args)?;
    let consumer = Consumer::start(Box::new(tractor), ImageFormat::Yuv422)?;

    let mut test_cards = 0;
    for _ in 0..args.frames {
        let frame = consumer.render()?;
        if frame.test_card {
            test_cards += 1;
        }
        info!(
            sequence = frame.sequence,
            timecode = frame.timecode,
            size = %format!("{}x{}", frame.width, frame.height),
            test_card = frame.test_card,
            "rendered"
        );
    }
    let audio_blocks = consumer.audio().drain().len();
    consumer.stop()?;

    info!(
        frames = args.frames,
        test_cards,
        audio_blocks,
        "Reel finished"
    );
    Ok(())
}

/// Two colour tracks joined by the requested transition under a tractor.
fn build_graph(context: &Arc<Context>, args: &Args) -> Result<Tractor> {
    let mut multitrack = Multitrack::new(context);
    multitrack.connect(Box::new(Producer::colour(context, &args.a)), 0);
    multitrack.connect(Box::new(Producer::colour(context, &args.b)), 1);

    let mut transition = match (&args.luma, args.transition) {
        (Some(path), EffectName::Luma) => {
            let map = LumaMap::load(path)
                .with_context(|| format!("Failed to load luma map {}", path.display()))?;
            Transition::luma(context, Some(map))
        }
        (_, effect) => Transition::with_effect(context, effect),
    };
    transition.set_in_and_out(args.window_in, args.window_out);
    transition.connect(Box::new(multitrack), 0, 1);
    info!(
        effect = %args.transition,
        window_in = args.window_in,
        window_out = args.window_out,
        "graph built"
    );

    Ok(Tractor::new(Box::new(transition)))
}
