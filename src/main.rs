use clap::Parser;
use device_query::Keycode;
use eframe::egui;
use rustpiano::audio::{AudioEngine, CpalEngine};
use rustpiano::input::{InputRouter, KeyboardHandler};
use rustpiano::instrument::VoiceManager;
use rustpiano::synth::{NoteCatalog, SynthConfig, Waveform};
use rustpiano::ui::{PianoApp, POLL_INTERVAL};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Play a piano with the mouse, a touch screen or the computer keyboard.
#[derive(Parser, Debug)]
#[command(name = "rustpiano", version)]
struct Args {
    /// Skip the window and play from the physical keyboard only
    #[arg(long)]
    headless: bool,

    /// Oscillator shape: sine, square, sawtooth, triangle or noise
    #[arg(long, default_value = "triangle")]
    waveform: Waveform,

    /// Master volume, 0.0 to 1.0
    #[arg(long, default_value_t = 0.65)]
    volume: f32,

    /// Most voices that may sound at once, counting releasing ones
    #[arg(long, default_value_t = 32)]
    max_voices: usize,

    /// Length of the release ramp in milliseconds
    #[arg(long, default_value_t = 200)]
    release_ms: u64,

    /// Extra wait after the release ramp before a voice is freed
    #[arg(long, default_value_t = 50)]
    margin_ms: u64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    tracing_log::LogTracer::init().ok();

    let args = Args::parse();
    let config = SynthConfig {
        max_voices: args.max_voices,
        waveform: args.waveform,
        master_volume: args.volume.clamp(0.0, 1.0),
        release: Duration::from_millis(args.release_ms),
        cleanup_margin: Duration::from_millis(args.margin_ms),
        ..SynthConfig::default()
    };
    info!(waveform = %config.waveform, max_voices = config.max_voices, "starting");

    let catalog = NoteCatalog::two_row_layout();
    let manager = match CpalEngine::new(&config) {
        Ok(engine) => VoiceManager::new(catalog, engine, &config),
        Err(err) => {
            error!(%err, "audio engine unavailable, continuing without sound");
            VoiceManager::without_engine(catalog, &config)
        }
    };

    if args.headless {
        run_headless(manager);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1060.0, 320.0])
            .with_title("Piano+"),
        ..Default::default()
    };
    let volume = config.master_volume;
    eframe::run_native(
        "rustpiano",
        options,
        Box::new(move |_cc| Box::new(PianoApp::new(manager, volume))),
    )
}

fn run_headless<E: AudioEngine>(mut manager: VoiceManager<E>) {
    let mut router = InputRouter::new(manager.catalog().clone());
    let mut keyboard_handler = KeyboardHandler::new();
    info!("headless: play on the keyboard, Escape quits");

    loop {
        for input in keyboard_handler.poll() {
            if let Some(event) = router.route(input) {
                manager.handle(&event);
            }
        }
        manager.tick();

        if keyboard_handler.is_held(Keycode::Escape) {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    manager.shutdown();
}
