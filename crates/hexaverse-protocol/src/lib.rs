mod colony;
mod event;
mod hex;
mod ids;
mod tile;
mod unit;
pub mod wire;

pub use crate::colony::*;
pub use crate::event::*;
pub use crate::hex::*;
pub use crate::ids::*;
pub use crate::tile::*;
pub use crate::unit::*;
pub use crate::wire::WireError;
