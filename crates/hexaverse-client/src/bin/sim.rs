//! Scripted end-to-end run of the synchronization engine against an
//! in-memory backend: seed a world, load a colony, replay a push script
//! (claims, a capture, a malformed frame), then stream a far region.
//!
//! Run with `RUST_LOG=debug` for per-event detail.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexaverse_client::harness::{MemoryStore, ScriptedTransport};
use hexaverse_client::{ColonySession, PushConnection};
use hexaverse_engine::{SyncConfig, TileCache};
use hexaverse_protocol::{
    wire, Colony, ColonyId, CubeCoord, PushEnvelope, PushPayload, Terrain, Tile, TileKey, Uid,
    Unit, UnitId,
};

const WORLD_RADIUS: i32 = 8;
const PLAYER: &str = "sim-player";
const RIVAL: &str = "sim-rival";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    seed_world(&store);

    let player = Uid::new(PLAYER);
    let cache = Arc::new(Mutex::new(TileCache::new()));
    let mut session = ColonySession::new(
        player.clone(),
        SyncConfig::default(),
        store.clone(),
        cache.clone(),
    );

    // Two-phase initial load: provisional frontier, then accurate data.
    assert!(session.load_for_user().await?);
    let refreshed = session.refresh_viewable().await?;
    info!(
        colony = session.state().colony_tiles().len(),
        viewable = session.state().viewable_tiles().len(),
        refreshed,
        "initial load complete"
    );

    // Replay a push script through the connection manager.
    let mut connection = PushConnection::new();
    let mut events = connection.subscribe();
    connection
        .init(ScriptedTransport::new(push_script(&player)))
        .await?;

    while let Ok(Some(envelope)) = timeout(Duration::from_millis(200), events.recv()).await {
        session.handle_envelope(envelope).await;
    }
    connection.shutdown().await;

    if let Some(color) = session.color_of(&Uid::new(RIVAL)) {
        info!(color, "rival color resolved");
    }

    // Camera pans to a far region; misses stream in through the cache.
    let streamed = session
        .ensure_region(CubeCoord::axial(WORLD_RADIUS, -WORLD_RADIUS), 2)
        .await?;
    info!(streamed, "region streamed after camera move");

    let report = SimReport {
        colony_tiles: session.state().colony_tiles().len(),
        viewable_tiles: session.state().viewable_tiles().len(),
        cached_tiles: cache.lock().await.len(),
        units: session.units().len(),
        fetch_calls: store.fetch_calls(),
        colony_digest: format!("{:016x}", session.colony_digest()?),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct SimReport {
    colony_tiles: usize,
    viewable_tiles: usize,
    cached_tiles: usize,
    units: usize,
    fetch_calls: usize,
    colony_digest: String,
}

/// Populate a hex disc of random terrain and give both players a start.
fn seed_world(store: &MemoryStore) {
    let mut rng = rand::thread_rng();

    for q in -WORLD_RADIUS..=WORLD_RADIUS {
        let r_min = (-WORLD_RADIUS).max(-q - WORLD_RADIUS);
        let r_max = WORLD_RADIUS.min(-q + WORLD_RADIUS);
        for r in r_min..=r_max {
            let mut tile = Tile::at(CubeCoord::axial(q, r)).with_terrain(random_terrain(&mut rng));
            tile.resource_density = Some(rng.gen_range(0.0..1.0));
            store.insert_tile(tile);
        }
    }

    let start = CubeCoord::ORIGIN;
    let mut owned_coords = vec![start];
    owned_coords.extend(start.neighbors().take(2));
    for &coord in &owned_coords {
        store.insert_tile(Tile::at(coord).with_controller(PLAYER));
    }
    let tile_ids: Vec<TileKey> = owned_coords.iter().map(|&coord| coord.into()).collect();

    store.insert_colony(Colony {
        id: ColonyId::new("sim-colony"),
        owner: Uid::new(PLAYER),
        name: "Simulation Landing".into(),
        tile_ids,
        start_coordinates: start,
        created_at_ms: 0,
    });
    store.set_color(RIVAL, "#d64550");
}

fn random_terrain(rng: &mut impl Rng) -> Terrain {
    match rng.gen_range(0..6) {
        0 => Terrain::Plains,
        1 => Terrain::Forest,
        2 => Terrain::Mountain,
        3 => Terrain::Water,
        4 => Terrain::Desert,
        _ => Terrain::Ice,
    }
}

/// The scripted push feed: an own claim, a rival capture, a viewable
/// update, a unit sighting, and two frames that must be dropped harmlessly.
fn push_script(player: &Uid) -> Vec<String> {
    let claim = Tile::at(CubeCoord::axial(-1, 0)).with_controller(player.0.as_str());
    let capture = Tile::at(CubeCoord::axial(1, -1)).with_controller(RIVAL);
    let mut viewable = Tile::at(CubeCoord::axial(0, 1)).with_terrain(Terrain::Forest);
    viewable.version = 2;
    let ship = Unit::Ship {
        id: UnitId::new("ship-1"),
        owner: Uid::new(RIVAL),
        position: CubeCoord::axial(2, -1),
        destination: None,
    };

    let encode = |payload: PushPayload| {
        let envelope = PushEnvelope {
            payload,
            user_id: None,
            colony_id: Some(ColonyId::new("sim-colony")),
            timestamp_ms: 0,
        };
        wire::encode_envelope_json(&envelope).expect("static script frame encodes")
    };

    vec![
        encode(PushPayload::TileUpdate(claim)),
        encode(PushPayload::TileUpdate(capture)),
        encode(PushPayload::TileUpdate(viewable)),
        encode(PushPayload::UnitUpdate(ship)),
        r#"{"payloadType":"leaderboard","payload":{"rank":1}}"#.to_string(),
        "{malformed".to_string(),
    ]
}
