use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CubeCoord;

/// Opaque player identity issued by the auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

/// Identifier of a colony aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColonyId(pub String);

/// Identifier of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub String);

/// Tile identifier: either the canonical `"q,r,s"` coordinate key or a
/// server-assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileKey(pub String);

impl TileKey {
    /// Parse back into a coordinate when the key is coordinate-derived.
    pub fn coord(&self) -> Option<CubeCoord> {
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<CubeCoord> for TileKey {
    fn from(coord: CubeCoord) -> TileKey {
        TileKey(coord.key())
    }
}

macro_rules! impl_string_id {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                pub fn new(raw: impl Into<String>) -> Self {
                    Self(raw.into())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $ty {
                fn from(raw: &str) -> Self {
                    Self(raw.to_string())
                }
            }
        )*
    };
}

impl_string_id!(Uid, ColonyId, UnitId, TileKey);
