//! Codecs for the push channel plus compact state digests.
//!
//! The push channel carries JSON text frames; digests encode through
//! MessagePack and hash with FNV-1a 64 for cheap state comparison.

use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::{Colony, PushEnvelope, Tile, TileMap};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_envelope_json(envelope: &PushEnvelope) -> Result<String, WireError> {
    Ok(serde_json::to_string(envelope)?)
}

pub fn decode_envelope_json(json: &str) -> Result<PushEnvelope, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_tile_json(tile: &Tile) -> Result<String, WireError> {
    Ok(serde_json::to_string(tile)?)
}

pub fn decode_tile_json(json: &str) -> Result<Tile, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn encode_colony_json(colony: &Colony) -> Result<String, WireError> {
    Ok(serde_json::to_string(colony)?)
}

pub fn decode_colony_json(json: &str) -> Result<Colony, WireError> {
    Ok(serde_json::from_str(json)?)
}

pub fn serialize_tile(tile: &Tile) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(tile)?)
}

pub fn deserialize_tile(bytes: &[u8]) -> Result<Tile, WireError> {
    Ok(decode::from_slice(bytes)?)
}

/// Deterministic digest of a single tile.
pub fn tile_digest(tile: &Tile) -> Result<u64, WireError> {
    Ok(hash_bytes_fnv1a64(&serialize_tile(tile)?))
}

/// Deterministic digest of a tile map, independent of hash-map iteration
/// order (entries are encoded in sorted key order).
pub fn tiles_digest(tiles: &TileMap) -> Result<u64, WireError> {
    let mut entries: Vec<_> = tiles.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let bytes = encode::to_vec(&entries)?;
    Ok(hash_bytes_fnv1a64(&bytes))
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CubeCoord, PushPayload, Terrain};

    #[test]
    fn envelope_json_roundtrip() {
        let envelope =
            PushEnvelope::tile_update(Tile::at(CubeCoord::ORIGIN).with_terrain(Terrain::Plains));
        let json = encode_envelope_json(&envelope).unwrap();
        let back = decode_envelope_json(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn malformed_frame_is_a_decode_error() {
        assert!(matches!(
            decode_envelope_json("{not json"),
            Err(WireError::Json(_))
        ));
    }

    #[test]
    fn tile_digest_tracks_content() {
        let tile = Tile::at(CubeCoord::ORIGIN).with_terrain(Terrain::Desert);
        let a = tile_digest(&tile).unwrap();
        let b = tile_digest(&tile).unwrap();
        assert_eq!(a, b);

        let changed = tile.clone().with_controller("user-2");
        assert_ne!(tile_digest(&changed).unwrap(), a);
    }

    #[test]
    fn tiles_digest_is_order_independent() {
        let mut forward = TileMap::new();
        let mut reverse = TileMap::new();
        let tiles: Vec<_> = (0..8)
            .map(|q| Tile::at(CubeCoord::axial(q, -q)).with_terrain(Terrain::Forest))
            .collect();
        for tile in &tiles {
            forward.insert(tile.key.clone(), tile.clone());
        }
        for tile in tiles.iter().rev() {
            reverse.insert(tile.key.clone(), tile.clone());
        }
        assert_eq!(
            tiles_digest(&forward).unwrap(),
            tiles_digest(&reverse).unwrap()
        );
    }

    #[test]
    fn matches_reference_fnv_vectors() {
        assert_eq!(hash_bytes_fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(hash_bytes_fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }
}
