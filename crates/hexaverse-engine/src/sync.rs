//! Authoritative in-memory split between owned colony tiles and the
//! viewable fog-of-war boundary.

use std::collections::HashMap;

use hexaverse_protocol::{CubeCoord, Tile, TileKey, TileMap, Visibility};

use crate::frontier;

/// Default fog-of-war expansion depth in hex steps.
pub const DEFAULT_VIEW_DEPTH: u32 = 5;

/// A visible-but-unowned tile, annotated with its hex distance from the
/// colony at the time it was discovered.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewableTile {
    pub tile: Tile,
    pub distance: u32,
}

/// Local tile state for one colony session.
///
/// `colony_tiles` holds tiles controlled by the current user; `viewable_tiles`
/// holds the unowned fog boundary. The two key sets never overlap.
#[derive(Clone, Debug)]
pub struct SyncState {
    colony_tiles: TileMap,
    viewable_tiles: HashMap<TileKey, ViewableTile>,
    view_depth: u32,
}

impl SyncState {
    pub fn new(view_depth: u32) -> SyncState {
        SyncState {
            colony_tiles: TileMap::new(),
            viewable_tiles: HashMap::new(),
            view_depth,
        }
    }

    pub fn view_depth(&self) -> u32 {
        self.view_depth
    }

    pub fn colony_tiles(&self) -> &TileMap {
        &self.colony_tiles
    }

    pub fn viewable_tiles(&self) -> &HashMap<TileKey, ViewableTile> {
        &self.viewable_tiles
    }

    pub fn viewable_keys(&self) -> Vec<TileKey> {
        self.viewable_tiles.keys().cloned().collect()
    }

    pub fn is_colony(&self, key: &TileKey) -> bool {
        self.colony_tiles.contains_key(key)
    }

    pub fn is_viewable(&self, key: &TileKey) -> bool {
        self.viewable_tiles.contains_key(key)
    }

    /// Insert or overwrite an owned tile, then expand the fog boundary
    /// incrementally from the added tile alone. Only net-new boundary tiles
    /// are inserted; existing viewable entries keep their data and distance.
    ///
    /// Cheaper than a full recompute but may under-discover relative to one;
    /// [`SyncState::recompute_viewable`] restores the exact boundary.
    pub fn add_colony_tile(&mut self, tile: Tile) {
        let coord = tile.coord;
        self.viewable_tiles.remove(&tile.key);
        self.colony_tiles.insert(tile.key.clone(), tile);

        for (key, found) in frontier::expand_from(coord, self.view_depth) {
            if self.colony_tiles.contains_key(&key) || self.viewable_tiles.contains_key(&key) {
                continue;
            }
            self.viewable_tiles.insert(
                key,
                ViewableTile {
                    tile: placeholder(found.coord),
                    distance: found.distance,
                },
            );
        }
    }

    /// Drop an owned tile. The viewable boundary is left as-is; callers that
    /// need an exact boundary follow up with [`SyncState::recompute_viewable`].
    pub fn remove_colony_tile(&mut self, key: &TileKey) -> Option<Tile> {
        self.colony_tiles.remove(key)
    }

    /// Replace the owned set with an authoritative snapshot and rebuild the
    /// full fog boundary from it. Newly discovered boundary tiles start as
    /// fogged placeholders so a provisional frontier can render immediately;
    /// known viewable data survives for keys that remain on the boundary.
    pub fn install_snapshot(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.colony_tiles = tiles
            .into_iter()
            .map(|tile| (tile.key.clone(), tile))
            .collect();
        self.recompute_viewable();
    }

    /// Full-recompute policy: rebuild `viewable_tiles` seeded by the complete
    /// colony set, fixing any stale distances the incremental path left
    /// behind.
    pub fn recompute_viewable(&mut self) {
        let boundary = frontier::viewable_frontier(&self.colony_tiles, self.view_depth);
        let mut next = HashMap::with_capacity(boundary.len());
        for (key, found) in boundary {
            let tile = self
                .viewable_tiles
                .remove(&key)
                .map(|entry| entry.tile)
                .unwrap_or_else(|| placeholder(found.coord));
            next.insert(
                key,
                ViewableTile {
                    tile,
                    distance: found.distance,
                },
            );
        }
        self.viewable_tiles = next;
    }

    /// Shallow merge of fetched tile data over the viewable map, keyed by
    /// tile id. An existing entry with a strictly newer `version` (a push
    /// update that raced ahead of the fetch) is left alone; unstamped
    /// versions on both sides degrade to last-write-wins. Colony keys and
    /// preview tiles are skipped. Returns how many entries were written.
    pub fn merge_viewable(&mut self, tiles: impl IntoIterator<Item = Tile>) -> usize {
        let mut written = 0;
        for tile in tiles {
            if tile.is_preview || self.colony_tiles.contains_key(&tile.key) {
                continue;
            }
            match self.viewable_tiles.get_mut(&tile.key) {
                Some(entry) => {
                    if entry.tile.version > tile.version {
                        continue;
                    }
                    entry.tile = tile;
                }
                None => {
                    let distance = self.distance_to_colony(tile.coord).unwrap_or(0);
                    self.viewable_tiles
                        .insert(tile.key.clone(), ViewableTile { tile, distance });
                }
            }
            written += 1;
        }
        written
    }

    /// Unconditional single-entry overwrite used by push reconciliation;
    /// push frames are newest by transport ordering. Inserts when absent
    /// (the debug show-all path).
    pub fn upsert_viewable(&mut self, tile: Tile) {
        if self.colony_tiles.contains_key(&tile.key) {
            return;
        }
        match self.viewable_tiles.get_mut(&tile.key) {
            Some(entry) => entry.tile = tile,
            None => {
                let distance = self.distance_to_colony(tile.coord).unwrap_or(0);
                self.viewable_tiles
                    .insert(tile.key.clone(), ViewableTile { tile, distance });
            }
        }
    }

    /// Minimum hex distance from `coord` to any owned tile.
    pub fn distance_to_colony(&self, coord: CubeCoord) -> Option<u32> {
        self.colony_tiles
            .values()
            .map(|tile| tile.coord.distance(coord) as u32)
            .min()
    }
}

fn placeholder(coord: CubeCoord) -> Tile {
    let mut tile = Tile::at(coord);
    tile.visibility = Visibility::Fogged;
    tile
}
