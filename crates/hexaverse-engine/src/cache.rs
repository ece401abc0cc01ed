//! Shared tile cache with TTL-bounded staleness.
//!
//! An optimization layer only, never authoritative: both the initial-load
//! path and push reconciliation write through it, last write wins.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::{Duration, Instant};

use hexaverse_protocol::{Tile, TileKey, TileMap};

pub const DEFAULT_TILE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
struct CacheEntry {
    tile: Tile,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct TileCache {
    entries: HashMap<TileKey, CacheEntry>,
    default_ttl: Duration,
}

impl Default for TileCache {
    fn default() -> Self {
        TileCache::new()
    }
}

impl TileCache {
    pub fn new() -> TileCache {
        TileCache::with_ttl(DEFAULT_TILE_TTL)
    }

    pub fn with_ttl(default_ttl: Duration) -> TileCache {
        TileCache {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Split `ids` into cached hits and misses. Duplicate ids are collapsed;
    /// expired entries are evicted and reported as misses. Never touches the
    /// network.
    pub fn get(&mut self, ids: &[TileKey]) -> (TileMap, Vec<TileKey>) {
        self.get_at(ids, Instant::now())
    }

    /// Clock-injected form of [`TileCache::get`], used by tests.
    pub fn get_at(&mut self, ids: &[TileKey], now: Instant) -> (TileMap, Vec<TileKey>) {
        let mut hits = TileMap::new();
        let mut misses = Vec::new();

        for id in ids {
            if hits.contains_key(id) || misses.contains(id) {
                continue;
            }
            if let Some(entry) = self.entries.get(id) {
                if now < entry.expires_at {
                    hits.insert(id.clone(), entry.tile.clone());
                    continue;
                }
            }
            // Absent or expired; an expired entry is evicted, not skipped.
            self.entries.remove(id);
            misses.push(id.clone());
        }

        (hits, misses)
    }

    /// Write a tile with the default TTL. Preview tiles are never cached.
    pub fn put(&mut self, tile: Tile) {
        self.put_with_ttl(tile, self.default_ttl);
    }

    /// Write a tile with an explicit TTL, resetting any existing expiry.
    pub fn put_with_ttl(&mut self, tile: Tile, ttl: Duration) {
        if tile.is_preview {
            return;
        }
        self.entries.insert(
            tile.key.clone(),
            CacheEntry {
                tile,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn put_all(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        for tile in tiles {
            self.put(tile);
        }
    }

    /// Force subsequent gets to miss these ids regardless of expiry.
    pub fn invalidate<'a>(&mut self, ids: impl IntoIterator<Item = &'a TileKey>) {
        for id in ids {
            self.entries.remove(id);
        }
    }

    /// Resolve `ids` through the cache, issuing at most one batched `fetch`
    /// call for the miss set. Fetched tiles are merged into the cache before
    /// the combined, duplicate-free result is returned. Ids the backend does
    /// not know stay absent from the result; fetch failure propagates
    /// unchanged.
    pub async fn fetch_all_with_cache<F, Fut, E>(
        &mut self,
        ids: &[TileKey],
        fetch: F,
    ) -> Result<Vec<Tile>, E>
    where
        F: FnOnce(Vec<TileKey>) -> Fut,
        Fut: Future<Output = Result<Vec<Tile>, E>>,
    {
        let (hits, misses) = self.get(ids);
        let mut seen: HashSet<TileKey> = hits.keys().cloned().collect();
        let mut tiles: Vec<Tile> = hits.into_values().collect();

        if misses.is_empty() {
            return Ok(tiles);
        }

        for tile in fetch(misses).await? {
            if !seen.insert(tile.key.clone()) {
                continue;
            }
            self.put(tile.clone());
            tiles.push(tile);
        }

        Ok(tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexaverse_protocol::{CubeCoord, Terrain};
    use std::cell::Cell;

    fn tile(q: i32, r: i32) -> Tile {
        Tile::at(CubeCoord::axial(q, r)).with_terrain(Terrain::Plains)
    }

    #[test]
    fn put_then_get_hits_without_network() {
        let mut cache = TileCache::new();
        let t = tile(0, 0);
        cache.put(t.clone());

        let (hits, misses) = cache.get(&[t.key.clone()]);
        assert_eq!(hits.len(), 1);
        assert!(misses.is_empty());
        assert_eq!(hits[&t.key], t);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = TileCache::new();
        let t = tile(1, 0);
        cache.put(t.clone());

        let after_expiry = Instant::now() + DEFAULT_TILE_TTL + Duration::from_secs(1);
        let (hits, misses) = cache.get_at(&[t.key.clone()], after_expiry);
        assert!(hits.is_empty());
        assert_eq!(misses, vec![t.key.clone()]);
        // The expired entry was evicted, not just skipped.
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_forces_miss_before_expiry() {
        let mut cache = TileCache::new();
        let t = tile(2, 0);
        cache.put(t.clone());
        cache.invalidate([&t.key]);

        let (hits, misses) = cache.get(&[t.key.clone()]);
        assert!(hits.is_empty());
        assert_eq!(misses, vec![t.key]);
    }

    #[test]
    fn preview_tiles_are_never_cached() {
        let mut cache = TileCache::new();
        let mut t = tile(3, 0);
        t.is_preview = true;
        cache.put(t);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn batched_fetch_requests_only_misses() {
        let mut cache = TileCache::new();
        let a = tile(0, 0);
        let b = tile(1, 0);
        let c = tile(2, 0);
        cache.put(a.clone());

        let calls = Cell::new(0usize);
        let ids = [a.key.clone(), b.key.clone(), c.key.clone()];
        let remote = vec![b.clone(), c.clone()];

        let tiles = cache
            .fetch_all_with_cache(&ids, |misses| {
                calls.set(calls.get() + 1);
                assert_eq!(misses, vec![b.key.clone(), c.key.clone()]);
                async move { Ok::<_, ()>(remote) }
            })
            .await
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(tiles.len(), 3);
        // Fetched tiles were merged into the cache.
        let (hits, misses) = cache.get(&ids);
        assert_eq!(hits.len(), 3);
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn fully_cached_fetch_issues_no_call() {
        let mut cache = TileCache::new();
        let a = tile(0, 1);
        cache.put(a.clone());

        let tiles = cache
            .fetch_all_with_cache::<_, _, ()>(&[a.key.clone()], |_misses| async move {
                panic!("network fetch must not run for cached ids")
            })
            .await
            .unwrap();
        assert_eq!(tiles, vec![a]);
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let mut cache = TileCache::new();
        let missing = TileKey::from(CubeCoord::axial(9, -9));

        let result = cache
            .fetch_all_with_cache(&[missing], |_| async { Err::<Vec<Tile>, _>("offline") })
            .await;
        assert_eq!(result, Err("offline"));
    }

    #[tokio::test]
    async fn absent_remote_ids_are_not_an_error() {
        let mut cache = TileCache::new();
        let missing = TileKey::from(CubeCoord::axial(5, -5));

        let tiles = cache
            .fetch_all_with_cache(&[missing], |_| async { Ok::<_, ()>(vec![]) })
            .await
            .unwrap();
        assert!(tiles.is_empty());
    }
}
