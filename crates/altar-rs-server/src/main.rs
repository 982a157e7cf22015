mod config;
mod persistence;
mod simulation;

use std::sync::Arc;
use std::time::Duration;

use altar_rs_game::{AltarRecipeStore, TICKS_PER_SECOND};
use config::ServerConfig;
use persistence::DataDir;
use rand::rngs::StdRng;
use rand::SeedableRng;
use simulation::Simulation;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load("server.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load server.toml: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Altar-RS Server v{} starting", env!("CARGO_PKG_VERSION"));
    let data_dir = DataDir::new(&config.world.data_dir);
    if let Err(e) = data_dir.ensure() {
        error!("Cannot create data dir {}: {e}", data_dir.root().display());
        std::process::exit(1);
    }
    info!(
        "Data dir: {}, tick interval: {}ms",
        data_dir.root().display(),
        config.server.tick_interval_ms
    );

    let store = match data_dir.load_store() {
        Ok(store) => store,
        Err(e) => {
            warn!("Failed to load altar recipes, starting empty: {e}");
            AltarRecipeStore::new()
        }
    };
    let saved = data_dir.load_altars().unwrap_or_else(|e| {
        warn!("Failed to load altars, reseeding from config: {e}");
        None
    });

    let mut sim = Simulation::new(&config, Arc::new(store), saved, StdRng::from_entropy());

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let auto_save_ticks = config.world.auto_save_interval * u64::from(TICKS_PER_SECOND);
    let max_ticks = config.server.max_ticks;
    let mut tick_interval =
        tokio::time::interval(Duration::from_millis(config.server.tick_interval_ms.max(1)));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                sim.game_tick();
                let tick = sim.current_tick();

                if auto_save_ticks > 0 && tick % auto_save_ticks == 0 && sim.needs_save() {
                    info!("Auto-saving altars (tick {tick})");
                    save_all(&data_dir, &mut sim);
                }
                if max_ticks > 0 && tick >= max_ticks {
                    info!("Tick limit {max_ticks} reached");
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    log_summary(&sim);
    info!("Saving altars before shutdown...");
    save_all(&data_dir, &mut sim);
    info!("Server shut down.");
}

fn save_all(data_dir: &DataDir, sim: &mut Simulation) {
    if let Err(e) = data_dir.save_store(sim.store()) {
        error!("Failed to save altar recipes: {e}");
    }
    let saved = sim.take_saved_altars();
    if let Err(e) = data_dir.save_altars(&saved) {
        error!("Failed to save altars: {e}");
    }
}

fn log_summary(sim: &Simulation) {
    info!(
        "Stopped at tick {} with {} loose items",
        sim.current_tick(),
        sim.world().item_count()
    );
    for altar in sim.altars() {
        let pos = altar.pos();
        let in_sync = sim
            .observer(pos)
            .is_some_and(|replica| replica.to_record() == altar.to_record());
        info!(
            "Altar at ({}, {}, {}): catalyst={}, infusion={:?}, observer in sync={in_sync}",
            pos.x,
            pos.y,
            pos.z,
            altar.contains_catalyst(),
            altar.infusion()
        );
    }
}
