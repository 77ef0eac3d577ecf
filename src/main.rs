//! Flipbook runner.
//!
//! Loads texture frames and animation definitions, spawns one sprite per
//! requested animation and simulates a fixed number of frames, logging every
//! playback event.

use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;

use flipbook::components::animationstate::PlayConfig;
use flipbook::components::sprite::Sprite;
use flipbook::game::{build_schedule, setup_world, spawn_animated, step, with_playhead};
use flipbook::resources::animationmanager::AnimationManager;
use flipbook::resources::gameconfig::GameConfig;
use flipbook::resources::texturestore::TextureStore;

/// Headless sprite animation player
#[derive(Parser)]
#[command(version, about = "Plays frame animations headlessly and logs their events.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Animation definitions JSON (overrides the config file).
    #[arg(long, value_name = "PATH")]
    animations: Option<String>,

    /// Texture manifest JSON (overrides the config file).
    #[arg(long, value_name = "PATH")]
    textures: Option<String>,

    /// Animation key to play; repeat for several sprites. Defaults to every loaded animation.
    #[arg(long = "play", value_name = "KEY")]
    play: Vec<String>,

    /// Play in reverse.
    #[arg(long)]
    reverse: bool,

    /// Number of frames to simulate.
    #[arg(long)]
    frames: Option<u32>,

    /// Simulated frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Print the loaded animations as JSON and exit.
    #[arg(long)]
    dump_json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // --------------- Configuration ---------------
    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}. Using defaults.", e);
    }
    if let Some(path) = cli.animations {
        config.animations_path = path;
    }
    if let Some(path) = cli.textures {
        config.textures_path = path;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(fps) = cli.fps {
        config.fps = fps;
    }

    // --------------- Assets ---------------
    let textures = match TextureStore::load_from_file(&config.textures_path) {
        Ok(textures) => textures,
        Err(e) => {
            error!("Failed to load textures from {}: {}", config.textures_path, e);
            std::process::exit(1);
        }
    };
    info!("Loaded {} textures", textures.len());

    let mut manager = AnimationManager::new();
    match manager.load_from_file(&textures, &config.animations_path, false) {
        Ok(created) => info!("Loaded {} animations", created.len()),
        Err(e) => {
            error!("Failed to load animations from {}: {}", config.animations_path, e);
            std::process::exit(1);
        }
    }

    if cli.dump_json {
        match manager.to_json(None) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize animations: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let keys: Vec<String> = if cli.play.is_empty() {
        manager.keys().map(str::to_string).collect()
    } else {
        cli.play
    };

    // --------------- ECS world + schedule ---------------
    let frames = config.frames;
    let dt = config.frame_delta();
    let mut world = setup_world(config, textures, manager);
    let mut update = build_schedule();

    for key in keys {
        let entity = spawn_animated(&mut world, Sprite::default());
        let reverse = cli.reverse;
        let started = with_playhead(&mut world, entity, |state, ctx| {
            if reverse {
                state.play_reverse(ctx, PlayConfig::new(key.as_str()), false);
            } else {
                state.play(ctx, PlayConfig::new(key.as_str()), false);
            }
            state.is_playing
        });
        if started != Some(true) {
            warn!("Animation '{}' did not start", key);
        }
    }

    // --------------- Main loop ---------------
    for _ in 0..frames {
        step(&mut world, &mut update, dt);
    }
    info!("Simulated {} frames", frames);
}
