mod cache;
mod config;
pub mod frontier;
pub mod reconcile;
mod sync;

pub use crate::cache::*;
pub use crate::config::*;
pub use crate::frontier::FrontierTile;
pub use crate::reconcile::{Disposition, Reconciled};
pub use crate::sync::*;
