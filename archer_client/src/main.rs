//! Headless game binary.
//!
//! Usage:
//!   cargo run -p archer_client -- [--config game.json] [--assets-dir assets] [--frame-hz 60]
//!
//! Runs the frame loop against a logging scene and animator. Input arrives
//! as console lines on stdin, standing in for keyboard and pointer events.
//!
//! Console commands:
//!   press <key>         - Key down (w/a/s/d move)
//!   release <key|all>   - Key up, or release everything
//!   click [button]      - Pointer press; `secondary` (default) toggles aiming
//!   status              - Show character status
//!   cvarlist            - List console variables
//!   quit                - Exit

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use archer_client::{Archer, Game};
use archer_shared::{
    config::GameConfig,
    render::{LogAnimator, LogScene},
    resources::FsAssetLoader,
};
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    assets_dir: Option<String>,
    frame_hz: Option<u32>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut out = Args {
        config: None,
        assets_dir: None,
        frame_hz: None,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--assets-dir" if i + 1 < args.len() => {
                out.assets_dir = Some(args[i + 1].clone());
                i += 2;
            }
            "--frame-hz" if i + 1 < args.len() => {
                let hz = args[i + 1]
                    .parse()
                    .with_context(|| format!("parse --frame-hz {}", args[i + 1]))?;
                out.frame_hz = Some(hz);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(out)
}

fn load_config(args: &Args) -> anyhow::Result<GameConfig> {
    let mut cfg = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(dir) = &args.assets_dir {
        cfg.asset_dirs.insert(0, dir.clone());
    }
    if let Some(hz) = args.frame_hz {
        cfg.frame_hz = hz;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let cfg = load_config(&args).context("load config")?;
    info!(frame_hz = cfg.frame_hz, asset_dirs = ?cfg.asset_dirs, "Starting game");

    let loader = FsAssetLoader::new(
        cfg.asset_dirs.iter().map(PathBuf::from).collect(),
        cfg.model_file.clone(),
    );
    let archer = Archer::new(&cfg, LogAnimator);
    let mut game = Game::new(cfg.clone(), LogScene::default(), archer);
    game.start_asset_load(loader);

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Game running. Type 'help' for commands, 'quit' to exit.");
    println!();

    let mut interval = tokio::time::interval(cfg.frame_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last = tokio::time::Instant::now();

    loop {
        interval.tick().await;

        while let Ok(line) = console_rx.try_recv() {
            match game.exec_console(&line) {
                Ok(output) => {
                    for line in output {
                        println!("{}", line);
                    }
                }
                Err(e) => println!("Error: {:#}", e),
            }
        }

        if game.quit_requested() {
            break;
        }

        let now = tokio::time::Instant::now();
        game.tick(now - last);
        last = now;
    }

    info!(frames = game.frame(), "Game stopped");
    Ok(())
}
