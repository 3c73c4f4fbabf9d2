//! SimvarIO - telemetry bridge daemon
//!
//! Runs the session over the built-in mock engine with a synthetic telemetry
//! feed, printing data-changed events to stdout. Useful for exercising the
//! whole pipeline (catalog -> registry -> session -> dispatcher -> events)
//! without a simulator installation.

use simvar_io::{AppConfig, MockEngine, SimSession, VariableCatalog, WireType};

use rand::Rng;
use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `simvar-io <path>` (positional)
/// - `simvar-io --config <path>` (flag-based)
/// - `simvar-io -c <path>` (short flag)
///
/// Defaults to `simvario.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "simvario.toml".to_string()
}

fn main() -> simvar_io::Result<()> {
    let config_path = parse_config_path();
    let (config, config_loaded) = match AppConfig::from_file(&config_path) {
        Ok(config) => (config, true),
        Err(_) => (AppConfig::defaults(), false),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    log::info!("SimvarIO v0.3.0 starting...");
    if config_loaded {
        log::info!("Using config: {config_path}");
    } else {
        log::info!("Config {config_path} not found, using defaults");
    }

    let catalog = VariableCatalog::builtin().with(config.custom_descriptors());
    let engine = MockEngine::new();
    let feed_engine = engine.clone();

    let mut session = SimSession::new(Box::new(engine), catalog, config.session_config());

    session.on_connection_change(|connected| {
        log::info!(
            "Simulator {}",
            if connected { "connected" } else { "disconnected" }
        );
    });
    session.on_data(|name, value| {
        println!("{name} = {value}");
    });

    for variable in &config.variables {
        if let Err(e) = session.add_variable(&variable.name) {
            log::error!("Skipping variable {}: {}", variable.name, e);
        }
    }

    session.start();

    // Shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(std::io::Error::other)?;

    // Synthetic telemetry feed answering the session's data requests
    let feed_running = Arc::clone(&running);
    let feed = thread::Builder::new()
        .name("demo-feed".to_string())
        .spawn(move || synthetic_feed(feed_engine, feed_running))?;

    log::info!("SimvarIO running. Press Ctrl-C to stop.");
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(200));
    }

    log::info!("Shutting down...");
    drop(session);
    if feed.join().is_err() {
        log::error!("Demo feed thread panicked");
    }
    log::info!("SimvarIO stopped");
    Ok(())
}

/// Answer each recorded data request once with a plausible value: drifting
/// floats, steady flags, a fixed aircraft title.
fn synthetic_feed(engine: MockEngine, running: Arc<AtomicBool>) {
    let mut rng = rand::thread_rng();
    let mut drift: HashMap<u32, f64> = HashMap::new();

    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(500));
        if !engine.is_connected() {
            continue;
        }

        let defined: HashMap<u32, (String, WireType)> = engine
            .defined()
            .into_iter()
            .map(|(id, name, _unit, wire_type)| (id, (name, wire_type)))
            .collect();

        for (request_id, definition_id) in engine.requested() {
            let Some((name, wire_type)) = defined.get(&definition_id) else {
                continue;
            };
            match wire_type {
                WireType::Float64 => {
                    let value = drift
                        .entry(request_id)
                        .or_insert_with(|| rng.gen_range(1000.0..10000.0));
                    *value += rng.gen_range(-25.0..25.0);
                    engine.inject_f64(request_id, *value);
                }
                WireType::Int32 => {
                    engine.inject_i32(request_id, 1);
                }
                wire_type if wire_type.is_string() => {
                    let text = if name.starts_with("TITLE") {
                        "Airbus A320neo"
                    } else {
                        "A320"
                    };
                    engine.inject_string(request_id, *wire_type, text);
                }
                _ => {}
            }
        }
        engine.clear_requested();
    }
}
