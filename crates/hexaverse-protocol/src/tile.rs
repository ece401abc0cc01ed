use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{CubeCoord, TileKey, Uid};

/// Terrain classification. Servers may introduce types this build does not
/// know about; those decode as [`Terrain::Unknown`] instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Plains,
    Forest,
    Mountain,
    Water,
    Desert,
    Ice,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Fog-of-war rendering state of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Fogged,
    #[default]
    Unexplored,
}

/// A single hex cell as exchanged with the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    #[serde(rename = "id")]
    pub key: TileKey,
    #[serde(flatten)]
    pub coord: CubeCoord,
    #[serde(rename = "type", default)]
    pub terrain: Terrain,
    /// Owning player; absent means unclaimed.
    #[serde(rename = "controllerUid", default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<Uid>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Relative resource richness in `0..=1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_density: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, f64>,
    /// Paint color assigned in drawing mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Transient hover-preview flag. Preview tiles are never persisted to
    /// the cache or treated as authoritative state.
    #[serde(default)]
    pub is_preview: bool,
    /// Server-stamped monotonic revision; 0 when the server did not stamp one.
    #[serde(default)]
    pub version: u64,
}

/// Tiles keyed by their canonical id.
pub type TileMap = HashMap<TileKey, Tile>;

impl Tile {
    /// A blank, unexplored tile at `coord` with a coordinate-derived key.
    pub fn at(coord: CubeCoord) -> Tile {
        Tile {
            key: TileKey::from(coord),
            coord,
            terrain: Terrain::Unknown,
            controller: None,
            visibility: Visibility::Unexplored,
            resource_density: None,
            resources: BTreeMap::new(),
            color: None,
            is_preview: false,
            version: 0,
        }
    }

    pub fn with_terrain(mut self, terrain: Terrain) -> Tile {
        self.terrain = terrain;
        self
    }

    pub fn with_controller(mut self, uid: impl Into<Uid>) -> Tile {
        self.controller = Some(uid.into());
        self.visibility = Visibility::Visible;
        self
    }

    pub fn is_controlled_by(&self, uid: &Uid) -> bool {
        self.controller.as_ref() == Some(uid)
    }

    pub fn is_claimed(&self) -> bool {
        self.controller.is_some()
    }
}
