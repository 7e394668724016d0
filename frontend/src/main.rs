use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chroma_core::machine::Machine;
use chroma_core::pattern::TestPattern;
use clap::Parser;
use log::LevelFilter;

use crate::bindings::BindingTable;
use crate::blit::{BlitDispatcher, VideoMode};
use crate::config::Config;
use crate::input::EventTranslator;
use crate::video::Display;

mod bindings;
mod blit;
mod config;
mod device_id;
mod filters;
mod input;
mod screenshot;
mod video;

#[derive(Parser, Debug)]
#[command(version, about = "SDL front end with scaling filters and rebindable input")]
struct Args {
    /// Config file path (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start fullscreen on the desktop resolution
    #[arg(long)]
    fullscreen: bool,
    /// Scaling filter
    #[arg(long, value_enum)]
    video_mode: Option<VideoMode>,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simplelog::SimpleLogger::init(level, simplelog::Config::default())
        .context("failed to initialize logger")?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let config = Config::load(&config_path)?;

    // CLI flags win over the config file.
    let fullscreen = args.fullscreen || config.fullscreen;
    let mode = args
        .video_mode
        .or(config.video_mode)
        .unwrap_or(VideoMode::Blocky);

    let table = BindingTable::build(&config.binding_pairs(), config.clear_default_bindings);

    let mut machine = TestPattern::new();
    run(&mut machine, &table, fullscreen, mode)
}

fn run(
    machine: &mut dyn Machine,
    table: &BindingTable,
    fullscreen: bool,
    mode: VideoMode,
) -> anyhow::Result<()> {
    let sdl = sdl2::init().map_err(|e| anyhow!("failed to initialize SDL2: {e}"))?;
    let sdl_video = sdl.video().map_err(|e| anyhow!("failed to init SDL video: {e}"))?;
    let sdl_joystick = sdl
        .joystick()
        .map_err(|e| anyhow!("failed to init SDL joystick: {e}"))?;

    // Opened handles must stay alive or SDL stops delivering their events.
    let joysticks = open_joysticks(&sdl_joystick);

    let mut display = Display::new(&sdl_video, "chroma", fullscreen)?;
    let mut frame = video::FrameBuffer::new();
    let mut dispatcher = BlitDispatcher::new(mode);
    let mut translator = EventTranslator::new();
    let mut event_pump = sdl
        .event_pump()
        .map_err(|e| anyhow!("failed to get event pump: {e}"))?;

    let mut paused = false;

    loop {
        // While paused, block on the queue instead of spinning.
        let outcome = translator.poll(&mut event_pump, paused, table, machine);
        if outcome.quit {
            break;
        }
        if outcome.toggle_pause {
            paused = !paused;
            log::info!("{}", if paused { "paused" } else { "resumed" });
        }
        if paused {
            continue;
        }

        let pitch = frame.pitch();
        let (width, height) = machine.run_frame(frame.screen_mut(), pitch);
        dispatcher.blit(frame.screen(), pitch, &mut display, width, height);

        if outcome.screenshot
            && let Err(e) = take_screenshot(&display)
        {
            log::error!("screenshot failed: {e:#}");
        }
    }

    drop(joysticks);
    Ok(())
}

fn open_joysticks(subsystem: &sdl2::JoystickSubsystem) -> Vec<sdl2::joystick::Joystick> {
    let count = match subsystem.num_joysticks() {
        Ok(n) => n,
        Err(e) => {
            log::warn!("failed to enumerate joysticks: {e}");
            return Vec::new();
        }
    };

    let mut opened = Vec::new();
    for index in 0..count {
        match subsystem.open(index) {
            Ok(joystick) => {
                log::info!("joystick {index}: {}", joystick.name());
                opened.push(joystick);
            }
            Err(e) => log::warn!("failed to open joystick {index}: {e}"),
        }
    }
    opened
}

fn take_screenshot(display: &Display) -> anyhow::Result<()> {
    let dir = dirs::picture_dir().unwrap_or_else(|| PathBuf::from("."));
    let path = screenshot::next_free_path(&dir);
    let (pixels, pitch, width, height) = display.output_region();
    screenshot::save(pixels, pitch, width, height, &path)?;
    log::info!("saved screenshot to {}", path.display());
    Ok(())
}
