//! Integration tests for the full synchronization flow: initial load,
//! viewable refresh, push reconciliation, and region streaming.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use hexaverse_client::harness::{MemoryStore, ScriptedTransport};
use hexaverse_client::{ColonySession, PushConnection, SessionError, StoreError};
use hexaverse_engine::{SyncConfig, TileCache};
use hexaverse_protocol::{
    wire, Colony, ColonyId, CubeCoord, PushEnvelope, Terrain, Tile, TileKey, Uid, Visibility,
};

const PLAYER: &str = "user-1";
const RIVAL: &str = "user-2";

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());

    // A disc of terrain around the origin.
    for q in -6..=6i32 {
        for r in (-6i32).max(-q - 6)..=6i32.min(-q + 6) {
            let mut tile = Tile::at(CubeCoord::axial(q, r)).with_terrain(Terrain::Plains);
            tile.visibility = Visibility::Visible;
            store.insert_tile(tile);
        }
    }

    // The player holds the origin and one neighbor.
    let owned = [CubeCoord::ORIGIN, CubeCoord::axial(1, -1)];
    for &coord in &owned {
        store.insert_tile(Tile::at(coord).with_controller(PLAYER));
    }
    store.insert_colony(Colony {
        id: ColonyId::new("col-1"),
        owner: Uid::new(PLAYER),
        name: "First Landing".into(),
        tile_ids: owned.iter().map(|&c| TileKey::from(c)).collect(),
        start_coordinates: CubeCoord::ORIGIN,
        created_at_ms: 0,
    });
    store.set_color(RIVAL, "#aa3355");
    store
}

fn session_for(store: &Arc<MemoryStore>) -> ColonySession {
    let config = SyncConfig {
        view_depth: 2,
        ..SyncConfig::default()
    };
    ColonySession::new(
        Uid::new(PLAYER),
        config,
        store.clone(),
        Arc::new(Mutex::new(TileCache::new())),
    )
}

fn frame(tile: Tile) -> String {
    wire::encode_envelope_json(&PushEnvelope::tile_update(tile)).unwrap()
}

/// Phase one installs a provisional frontier from one batched fetch; phase
/// two replaces the placeholders with accurate server data.
#[tokio::test]
async fn two_phase_initial_load() {
    let store = seeded_store();
    let mut session = session_for(&store);

    assert!(session.load_for_user().await.unwrap());
    assert_eq!(session.state().colony_tiles().len(), 2);
    assert_eq!(store.fetch_calls(), 1);

    // Phase one: boundary exists but is provisional (fogged placeholders).
    let boundary = session.state().viewable_tiles();
    assert!(!boundary.is_empty());
    assert!(boundary
        .values()
        .all(|entry| entry.tile.visibility == Visibility::Fogged));

    // Phase two: accurate terrain streams in.
    let refreshed = session.refresh_viewable().await.unwrap();
    assert!(refreshed > 0);
    let known = session
        .state()
        .viewable_tiles()
        .values()
        .filter(|entry| entry.tile.terrain == Terrain::Plains)
        .count();
    assert_eq!(known, refreshed);
}

/// A warm cache satisfies a reload without another network round-trip.
#[tokio::test]
async fn reload_hits_the_cache() {
    let store = seeded_store();
    let mut session = session_for(&store);

    session.load_for_user().await.unwrap();
    let calls_after_first = store.fetch_calls();

    let colony = session.colony().unwrap().clone();
    session.load_initial(colony).await.unwrap();
    assert_eq!(store.fetch_calls(), calls_after_first);
}

/// Claims, captures, and malformed frames flow through the connection into
/// the session: the capture drops the tile and resolves the rival's color,
/// the claim promotes a viewable tile, and garbage is dropped harmlessly.
#[tokio::test]
async fn push_flow_reconciles_against_loaded_state() {
    let store = seeded_store();
    let mut session = session_for(&store);
    session.load_for_user().await.unwrap();
    session.refresh_viewable().await.unwrap();

    let claimed_key = TileKey::from(CubeCoord::axial(0, 1));
    assert!(session.state().is_viewable(&claimed_key));
    let captured_key = TileKey::from(CubeCoord::axial(1, -1));

    let frames = vec![
        "{malformed".to_string(),
        frame(Tile::at(CubeCoord::axial(0, 1)).with_controller(PLAYER)),
        frame(Tile::at(CubeCoord::axial(1, -1)).with_controller(RIVAL)),
    ];

    let mut connection = PushConnection::new();
    let mut events = connection.subscribe();
    connection.init(ScriptedTransport::new(frames)).await.unwrap();
    while let Ok(Some(envelope)) = timeout(Duration::from_millis(100), events.recv()).await {
        session.handle_envelope(envelope).await;
    }
    connection.shutdown().await;

    // Own claim: promoted out of viewable, colony list updated.
    assert!(session.state().is_colony(&claimed_key));
    assert!(!session.state().is_viewable(&claimed_key));
    assert!(session.colony().unwrap().contains(&claimed_key));

    // Opponent capture: dropped from the colony, color resolved once.
    assert!(!session.state().is_colony(&captured_key));
    assert!(!session.colony().unwrap().contains(&captured_key));
    assert_eq!(session.color_of(&Uid::new(RIVAL)), Some("#aa3355"));
    assert_eq!(store.color_calls(), 1);

    // A second capture event for the same rival reuses the memoized color.
    session
        .handle_envelope(PushEnvelope::tile_update(
            Tile::at(CubeCoord::axial(0, 1)).with_controller(RIVAL),
        ))
        .await;
    assert_eq!(store.color_calls(), 1);
}

/// A late viewable refetch for a colony the session no longer shows must be
/// discarded instead of clobbering the new colony's state.
#[tokio::test]
async fn stale_refetch_is_discarded() {
    let store = seeded_store();
    let mut session = session_for(&store);
    session.load_for_user().await.unwrap();

    let stale = vec![Tile::at(CubeCoord::axial(0, 1)).with_terrain(Terrain::Ice)];
    let merged = session.merge_refetched(stale, &ColonyId::new("a-colony-from-before"));
    assert_eq!(merged, 0);

    let key = TileKey::from(CubeCoord::axial(0, 1));
    assert_ne!(
        session.state().viewable_tiles()[&key].tile.terrain,
        Terrain::Ice
    );
}

/// Region streaming fetches each tile once; panning back over cached ground
/// issues no further network calls.
#[tokio::test]
async fn region_streaming_is_cache_backed() {
    let store = seeded_store();
    let mut session = session_for(&store);
    session.load_for_user().await.unwrap();

    let calls_before = store.fetch_calls();
    let center = CubeCoord::axial(4, -2);

    let streamed = session.ensure_region(center, 2).await.unwrap();
    assert!(streamed > 0);
    assert_eq!(store.fetch_calls(), calls_before + 1);

    let again = session.ensure_region(center, 2).await.unwrap();
    assert_eq!(store.fetch_calls(), calls_before + 1);
    assert_eq!(again, streamed);
}

/// Network failure during the initial load surfaces to the caller; nothing
/// is silently substituted.
#[tokio::test]
async fn offline_load_propagates_the_failure() {
    let store = seeded_store();
    let mut session = session_for(&store);
    store.set_offline(true);

    let err = session.load_for_user().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Store(StoreError::Network(_))
    ));

    // Back online, the same session recovers.
    store.set_offline(false);
    assert!(session.load_for_user().await.unwrap());
}
