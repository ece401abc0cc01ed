//! Hexaverse client-side synchronization.
//!
//! Maintains a local cache of hex tiles, the fog-of-war boundary, and the
//! colony/viewable split, reconciling push updates against fetched state.

pub mod connection;
pub mod harness;
pub mod session;
pub mod store;

pub use connection::{ConnectionError, ConnectionState, PushConnection, PushTransport};
pub use session::{ColonySession, SessionError};
pub use store::{StoreError, TileStore};
