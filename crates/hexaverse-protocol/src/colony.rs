use serde::{Deserialize, Serialize};

use crate::{ColonyId, CubeCoord, TileKey, Uid};

/// A player's owned aggregate of tiles. Created once per user by the
/// external creation flow; its tile list changes as tiles are gained or
/// lost, and it is the root from which the initial load originates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Colony {
    pub id: ColonyId,
    #[serde(rename = "uid")]
    pub owner: Uid,
    pub name: String,
    #[serde(default)]
    pub tile_ids: Vec<TileKey>,
    pub start_coordinates: CubeCoord,
    #[serde(rename = "createdAt", default)]
    pub created_at_ms: u64,
}

impl Colony {
    pub fn contains(&self, key: &TileKey) -> bool {
        self.tile_ids.iter().any(|id| id == key)
    }

    /// Record a gained tile. No-op when already present.
    pub fn add_tile(&mut self, key: TileKey) {
        if !self.contains(&key) {
            self.tile_ids.push(key);
        }
    }

    /// Record a lost tile.
    pub fn remove_tile(&mut self, key: &TileKey) {
        self.tile_ids.retain(|id| id != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colony() -> Colony {
        Colony {
            id: ColonyId::new("col-1"),
            owner: Uid::new("user-1"),
            name: "First Landing".into(),
            tile_ids: vec![TileKey::from(CubeCoord::ORIGIN)],
            start_coordinates: CubeCoord::ORIGIN,
            created_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn tile_membership_is_idempotent() {
        let mut colony = colony();
        let key = TileKey::from(CubeCoord::axial(1, 0));

        colony.add_tile(key.clone());
        colony.add_tile(key.clone());
        assert_eq!(colony.tile_ids.len(), 2);

        colony.remove_tile(&key);
        colony.remove_tile(&key);
        assert_eq!(colony.tile_ids.len(), 1);
    }

    #[test]
    fn wire_roundtrip() {
        let colony = colony();
        let json = serde_json::to_string(&colony).unwrap();
        let back: Colony = serde_json::from_str(&json).unwrap();
        assert_eq!(back, colony);
    }
}
