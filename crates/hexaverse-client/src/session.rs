//! A user's live colony session: local tile state plus the fetch and
//! reconciliation paths that keep it consistent.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use hexaverse_engine::{frontier, reconcile, Disposition, SyncConfig, SyncState, TileCache};
use hexaverse_protocol::{
    wire, Colony, ColonyId, CubeCoord, PushEnvelope, PushPayload, Tile, TileKey, Uid, Unit, UnitId,
    WireError,
};

use crate::store::{StoreError, TileStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("no colony loaded")]
    NoColony,
}

/// One signed-in user's view of the world.
///
/// All mutation funnels through `&mut self` on a single task, so the
/// interleaving hazards between fetches and pushes are handled by merge
/// logic (version guards, colony tags), never by locking discipline.
pub struct ColonySession {
    uid: Uid,
    config: SyncConfig,
    store: Arc<dyn TileStore>,
    /// Process-wide tile cache, shared with any other live session.
    cache: Arc<Mutex<TileCache>>,
    state: SyncState,
    colony: Option<Colony>,
    /// Tag for in-flight async work; results for another colony are stale.
    active_colony: Option<ColonyId>,
    /// Memoized controller display colors.
    colors: HashMap<Uid, Option<String>>,
    units: HashMap<UnitId, Unit>,
}

impl ColonySession {
    pub fn new(
        uid: Uid,
        config: SyncConfig,
        store: Arc<dyn TileStore>,
        cache: Arc<Mutex<TileCache>>,
    ) -> ColonySession {
        let view_depth = config.view_depth;
        ColonySession {
            uid,
            config,
            store,
            cache,
            state: SyncState::new(view_depth),
            colony: None,
            active_colony: None,
            colors: HashMap::new(),
            units: HashMap::new(),
        }
    }

    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn colony(&self) -> Option<&Colony> {
        self.colony.as_ref()
    }

    pub fn units(&self) -> &HashMap<UnitId, Unit> {
        &self.units
    }

    /// Memoized color for a controller, if one has been resolved.
    pub fn color_of(&self, uid: &Uid) -> Option<&str> {
        self.colors.get(uid).and_then(|c| c.as_deref())
    }

    /// Digest of the owned tile set, for cheap state comparison.
    pub fn colony_digest(&self) -> Result<u64, WireError> {
        wire::tiles_digest(self.state.colony_tiles())
    }

    /// Look up the user's colony and load it. Returns `false` when the user
    /// has no colony yet (nothing to sync).
    pub async fn load_for_user(&mut self) -> Result<bool, SessionError> {
        match self.store.get_colony(&self.uid).await? {
            Some(colony) => {
                self.load_initial(colony).await?;
                Ok(true)
            }
            None => {
                info!(uid = %self.uid, "user has no colony yet");
                Ok(false)
            }
        }
    }

    /// Phase one of the initial load: resolve the colony's tiles through the
    /// shared cache (one batched network call for the misses) and install
    /// the authoritative snapshot, fog boundary included, so a provisional
    /// frontier can render immediately. Accurate boundary data follows via
    /// [`ColonySession::refresh_viewable`].
    pub async fn load_initial(&mut self, colony: Colony) -> Result<(), SessionError> {
        info!(colony = %colony.id, tiles = colony.tile_ids.len(), "loading colony");

        let store = Arc::clone(&self.store);
        let tiles = {
            let mut cache = self.cache.lock().await;
            cache
                .fetch_all_with_cache(&colony.tile_ids, |misses| async move {
                    store.fetch_tiles(misses).await
                })
                .await?
        };

        self.state = SyncState::new(self.config.view_depth);
        self.state.install_snapshot(tiles);
        self.active_colony = Some(colony.id.clone());
        self.colony = Some(colony);
        debug!(
            viewable = self.state.viewable_tiles().len(),
            "provisional frontier installed"
        );
        Ok(())
    }

    /// Phase two: re-fetch the actual data behind every provisional viewable
    /// tile, invalidating their cache entries first so the fetch cannot be
    /// satisfied by speculative defaults. The merge is tagged with the
    /// colony the refresh started for; see [`ColonySession::merge_refetched`].
    pub async fn refresh_viewable(&mut self) -> Result<usize, SessionError> {
        let started_for = self.active_colony.clone().ok_or(SessionError::NoColony)?;
        let keys = self.state.viewable_keys();
        if keys.is_empty() {
            return Ok(0);
        }

        {
            let mut cache = self.cache.lock().await;
            cache.invalidate(keys.iter());
        }

        let mut fetched = Vec::new();
        for chunk in keys.chunks(self.config.fetch_batch.max(1)) {
            fetched.extend(self.store.fetch_tiles(chunk.to_vec()).await?);
        }

        {
            let mut cache = self.cache.lock().await;
            cache.put_all(fetched.iter().cloned());
        }

        Ok(self.merge_refetched(fetched, &started_for))
    }

    /// Merge refetched viewable data, unless the session has moved to a
    /// different colony since the fetch was issued; late results for a
    /// superseded colony are discarded. Push updates that raced ahead of
    /// the fetch survive via the per-tile version guard in the merge.
    pub fn merge_refetched(&mut self, tiles: Vec<Tile>, started_for: &ColonyId) -> usize {
        if self.active_colony.as_ref() != Some(started_for) {
            warn!(colony = %started_for, "discarding viewable refetch for superseded colony");
            return 0;
        }
        let merged = self.state.merge_viewable(tiles);
        debug!(merged, "viewable refetch merged");
        merged
    }

    /// Apply one push envelope. Decode errors never get this far; payloads
    /// this build does not understand are dropped here. Each envelope is a
    /// single state transition and one bad event never blocks the next.
    pub async fn handle_envelope(&mut self, envelope: PushEnvelope) {
        match envelope.payload {
            PushPayload::TileUpdate(tile) => self.handle_tile_update(tile).await,
            PushPayload::UnitUpdate(unit) => {
                debug!(unit = %unit.id(), "unit update");
                self.units.insert(unit.id().clone(), unit);
            }
            PushPayload::Unknown => debug!("ignoring unrecognized push payload"),
        }
    }

    async fn handle_tile_update(&mut self, tile: Tile) {
        let key = tile.key.clone();
        let fx = reconcile::apply(
            &mut self.state,
            Some(&self.uid),
            tile,
            self.config.show_all_tiles,
        );

        match &fx.disposition {
            Disposition::OwnTile => {
                info!(%key, "tile joined colony");
                if let Some(colony) = &mut self.colony {
                    colony.add_tile(key.clone());
                }
            }
            Disposition::OpponentCapture {
                previous_controller,
            } => {
                info!(%key, ?previous_controller, "tile captured by opponent");
                if let Some(colony) = &mut self.colony {
                    colony.remove_tile(&key);
                }
            }
            Disposition::ViewableUpdate => debug!(%key, "viewable tile updated"),
            Disposition::Ignored => debug!(%key, "tile update ignored"),
        }

        if let Some(tile) = fx.cache_write {
            self.cache.lock().await.put(tile);
        }
        if let Some(controller) = fx.lookup_color {
            let _ = self.controller_color(&controller).await;
        }
    }

    /// Resolve and memoize a controller's display color. Lookup failures are
    /// not memoized so a later event can retry.
    pub async fn controller_color(&mut self, uid: &Uid) -> Option<String> {
        if let Some(cached) = self.colors.get(uid) {
            return cached.clone();
        }
        match self.store.colony_color(uid).await {
            Ok(color) => {
                self.colors.insert(uid.clone(), color.clone());
                color
            }
            Err(err) => {
                warn!(%uid, "color lookup failed: {err}");
                None
            }
        }
    }

    /// Camera-driven streaming: make sure every tile within `radius` of
    /// `center` is known locally, fetching misses through the cache in one
    /// batched call. Unowned results land in the viewable map; owned tiles
    /// are never overwritten. Returns how many viewable entries changed.
    pub async fn ensure_region(
        &mut self,
        center: CubeCoord,
        radius: u32,
    ) -> Result<usize, SessionError> {
        let mut keys: Vec<TileKey> = vec![TileKey::from(center)];
        keys.extend(frontier::expand_from(center, radius).into_keys());
        keys.retain(|key| !self.state.is_colony(key));

        let store = Arc::clone(&self.store);
        let tiles = {
            let mut cache = self.cache.lock().await;
            cache
                .fetch_all_with_cache(&keys, |misses| async move {
                    store.fetch_tiles(misses).await
                })
                .await?
        };

        Ok(self.state.merge_viewable(tiles))
    }
}
