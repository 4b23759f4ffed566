use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use claim_engine::capability::Capability;
use claim_engine::store::MemoryStore;
use claim_engine::world::World;
use claim_engine::world::block::BlockType;
use claim_engine::world::position::{BlockPos, DimensionId};
use claim_server::addon::{Collaborators, LandClaims};
use claim_server::config::ClaimConfig;
use claim_server::dashboard;
use claim_server::event_bus::BusNotifier;
use claim_server::ambient::BurnSweepLayer;
use claim_server::host::{AutoDialog, Economy, Ledger};
use claim_server::persistence::JsonFileStore;
use claim_server::signals::{ActorSignal, BlockPlace, Explosion};
use claim_server::workflow::ClaimRequest;

#[tokio::main]
async fn main() -> Result<()> {
    let demo_mode = std::env::args().any(|a| a == "--demo");
    let config_path: PathBuf = std::env::args()
        .skip_while(|a| a != "--config")
        .nth(1)
        .unwrap_or_else(|| "claims.json".into())
        .into();

    let mut config = ClaimConfig::load(&config_path)?;
    if let Some(dir) = std::env::args().skip_while(|a| a != "--data").nth(1) {
        config.storage.data_dir = dir.into();
    }
    if let Some(port) = std::env::args()
        .skip_while(|a| a != "--dashboard-port")
        .nth(1)
        .and_then(|s| s.parse().ok())
    {
        config.dashboard.port = port;
    }

    let fallback = config.log_level.0.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&fallback))
                .context("invalid log level")?,
        )
        .init();

    if demo_mode {
        return run_demo().await;
    }

    tracing::info!("Land claims add-on starting");

    let store = JsonFileStore::open(&config.storage.data_dir)?;
    let world = Arc::new(World::new());
    let host = Collaborators {
        store: Arc::new(store),
        economy: Arc::new(Ledger::new(config.economy.price_per_block)),
        dialog: Arc::new(AutoDialog::confirming()),
        world,
        bus: BusNotifier::new(),
    };
    let dashboard_port = config.dashboard.port;
    let claims = LandClaims::new(config, host)?;

    claims.start_monitors();

    let dash = claims.dashboard_state();
    tokio::spawn(async move {
        dashboard::server::start(dash, dashboard_port).await;
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl+C received, shutting down ({} lands registered)", claims.lands.len());
    Ok(())
}

/// Scripted walk through the core behaviours against in-memory collaborators.
async fn run_demo() -> Result<()> {
    tracing::info!("Land claims -- demo");

    let mut config = ClaimConfig::default();
    config.economy.price_per_block = 2;
    let ledger = Arc::new(Ledger::new(config.economy.price_per_block));
    let world = Arc::new(World::new());
    let claims = LandClaims::new(config, Collaborators {
        store: Arc::new(MemoryStore::new()),
        economy: ledger.clone(),
        dialog: Arc::new(AutoDialog::confirming()),
        world: world.clone(),
        bus: BusNotifier::new(),
    })?;

    let main = DimensionId::new("main");
    let alice = claims.actor("Alice");
    let bob = claims.actor("Bob");
    ledger.deposit(&alice.id, 10_000);

    let request = |name: &str, start: BlockPos, end: BlockPos| ClaimRequest {
        actor: alice.clone(),
        name: name.to_string(),
        dimension: main.clone(),
        start,
        end,
    };

    // 1. A fresh claim is priced by volume and paid for.
    let home = claims
        .workflow
        .submit(request("Home", BlockPos::new(0, 64, 0), BlockPos::new(10, 70, 10)))
        .await?;
    tracing::info!(
        "Claimed '{}' ({} blocks), balance now {}",
        home.name,
        home.capacity(),
        ledger.balance(&alice.id)
    );

    // 2. An overlapping claim is rejected, naming the conflict.
    let home2 = request("Home2", BlockPos::new(5, 64, 5), BlockPos::new(15, 70, 15));
    match claims.workflow.submit(home2.clone()).await {
        Ok(_) => tracing::warn!("Overlapping claim unexpectedly succeeded"),
        Err(e) => tracing::info!("Home2 rejected: {}", e),
    }

    // 3. After deleting Home the same claim goes through.
    claims.manager.delete(&alice, "Home")?;
    claims.workflow.submit(home2).await?;
    tracing::info!("Home2 claimed after deleting Home");

    // 4. Bob cannot build on Alice's land...
    let inside = BlockPos::new(8, 66, 8);
    let mut place = BlockPlace::new(bob.clone(), main.clone(), inside, BlockType::new("minecraft:dirt"));
    claims.interceptor.on_block_place(&mut place);
    tracing::info!("Bob places inside Home2: cancelled={}", place.is_cancelled());

    // 5. ...until Alice opens placing to the public.
    claims.manager.set_public_flag(&alice, "Home2", Capability::Place, true)?;
    let mut place = BlockPlace::new(bob, main.clone(), inside, BlockType::new("minecraft:dirt"));
    claims.interceptor.on_block_place(&mut place);
    tracing::info!("Bob places again: cancelled={}", place.is_cancelled());

    // 6. Explosions only reach unclaimed blocks.
    let mut blast = Explosion::new(
        main.clone(),
        Some("minecraft:tnt".into()),
        vec![BlockPos::new(14, 66, 14), BlockPos::new(16, 66, 16), BlockPos::new(17, 66, 16)],
    );
    let spared = claims.interceptor.on_explosion(&mut blast);
    tracing::info!("Explosion spared {} claimed blocks, {} still impacted", spared, blast.impacted.len());

    // Burn sweep: fire inside Home2 is put out.
    world.set_block(&main, BlockPos::new(6, 65, 6), BlockType::new("minecraft:fire"));
    let sweep = BurnSweepLayer::new(
        claims.lands.clone(),
        world.clone(),
        claims.metrics.clone(),
        std::time::Duration::from_millis(claims.config.monitor.burn_sweep_interval_ms),
    );
    tracing::info!("Burn sweep cleared {} blocks", sweep.sweep());

    let snap = claims.metrics.snapshot(claims.lands.len() as u64);
    tracing::info!("Final metrics: {}", serde_json::to_string(&snap)?);
    Ok(())
}
