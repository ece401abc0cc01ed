//! In-memory backend and scripted transport for tests and the sim binary.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use hexaverse_protocol::{Colony, Tile, TileKey, TileMap, Uid};

use crate::connection::{ConnectionError, PushTransport};
use crate::store::{StoreError, TileStore};

/// A [`TileStore`] backed by hash maps, with call counters so tests can
/// assert on batching behavior.
#[derive(Default)]
pub struct MemoryStore {
    tiles: Mutex<TileMap>,
    colonies: Mutex<HashMap<Uid, Colony>>,
    colors: Mutex<HashMap<Uid, String>>,
    fetch_calls: AtomicUsize,
    color_calls: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn insert_tile(&self, tile: Tile) {
        self.tiles.lock().unwrap().insert(tile.key.clone(), tile);
    }

    pub fn insert_colony(&self, colony: Colony) {
        self.colonies
            .lock()
            .unwrap()
            .insert(colony.owner.clone(), colony);
    }

    pub fn set_color(&self, uid: impl Into<Uid>, color: impl Into<String>) {
        self.colors.lock().unwrap().insert(uid.into(), color.into());
    }

    /// Number of `fetch_tiles` round-trips issued so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `colony_color` round-trips issued so far.
    pub fn color_calls(&self) -> usize {
        self.color_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent fetch fail, simulating an outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl TileStore for MemoryStore {
    async fn fetch_tiles(&self, ids: Vec<TileKey>) -> Result<Vec<Tile>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("simulated outage".into()));
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let tiles = self.tiles.lock().unwrap();
        Ok(ids.iter().filter_map(|id| tiles.get(id).cloned()).collect())
    }

    async fn get_colony(&self, uid: &Uid) -> Result<Option<Colony>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("simulated outage".into()));
        }
        Ok(self.colonies.lock().unwrap().get(uid).cloned())
    }

    async fn colony_color(&self, uid: &Uid) -> Result<Option<String>, StoreError> {
        self.color_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.colors.lock().unwrap().get(uid).cloned())
    }
}

/// A [`PushTransport`] replaying a fixed list of frames, then idling like a
/// quiet socket so shutdown paths stay exercisable.
pub struct ScriptedTransport {
    frames: VecDeque<String>,
    connected: bool,
}

impl ScriptedTransport {
    pub fn new(frames: impl IntoIterator<Item = String>) -> ScriptedTransport {
        ScriptedTransport {
            frames: frames.into_iter().collect(),
            connected: false,
        }
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn connect(&mut self) -> Result<(), ConnectionError> {
        self.connected = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<String> {
        if !self.connected {
            return None;
        }
        match self.frames.pop_front() {
            Some(frame) => {
                tokio::task::yield_now().await;
                Some(frame)
            }
            // Script exhausted: behave like an idle connection.
            None => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}
