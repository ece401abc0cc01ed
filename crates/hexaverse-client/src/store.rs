//! External collaborator interfaces: remote tile/colony storage.

use async_trait::async_trait;
use thiserror::Error;

use hexaverse_protocol::{Colony, Tile, TileKey, Uid, WireError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(#[from] WireError),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Remote storage for tiles and colonies.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Fetch whatever subset of `ids` exists server-side. Ids the backend
    /// does not know are simply absent from the result, not an error.
    async fn fetch_tiles(&self, ids: Vec<TileKey>) -> Result<Vec<Tile>, StoreError>;

    /// The colony owned by `uid`, if one has been created.
    async fn get_colony(&self, uid: &Uid) -> Result<Option<Colony>, StoreError>;

    /// Display color for a controller identity. Rendering annotation only.
    async fn colony_color(&self, uid: &Uid) -> Result<Option<String>, StoreError>;
}
