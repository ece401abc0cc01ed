use serde::{Deserialize, Serialize};

use crate::{ColonyId, Tile, Uid, Unit};

/// Typed payload of a push frame, discriminated by `payloadType`.
///
/// Frame types this build does not recognize decode as [`PushPayload::Unknown`]
/// so new server-side message kinds never break the reconciliation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payloadType", content = "payload", rename_all = "camelCase")]
pub enum PushPayload {
    TileUpdate(Tile),
    UnitUpdate(Unit),
    #[serde(other)]
    Unknown,
}

/// Envelope for every frame delivered on the push channel.
///
/// The transport guarantees in-order delivery per connection; no ordering
/// exists between a push frame and a concurrently issued fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEnvelope {
    #[serde(flatten)]
    pub payload: PushPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colony_id: Option<ColonyId>,
    #[serde(rename = "timestamp", default)]
    pub timestamp_ms: u64,
}

impl PushEnvelope {
    pub fn tile_update(tile: Tile) -> PushEnvelope {
        PushEnvelope {
            payload: PushPayload::TileUpdate(tile),
            user_id: None,
            colony_id: None,
            timestamp_ms: 0,
        }
    }
}
