//! Classification and application of push tile updates against local state.

use hexaverse_protocol::{Tile, Uid};

use crate::sync::SyncState;

/// How an incoming tile update relates to local state, in match order:
/// own tile first, then loss of a held tile, then a plain viewable refresh.
#[derive(Clone, Debug, PartialEq)]
pub enum Disposition {
    /// The current user controls the tile: it joins the colony set.
    OwnTile,
    /// A tile we held now carries a different, non-empty controller.
    OpponentCapture { previous_controller: Option<Uid> },
    /// An update for a tile on the fog boundary (or the debug show-all path).
    ViewableUpdate,
    /// No relation to local state; dropped without mutation.
    Ignored,
}

/// Outcome of applying an update: how it was classified plus the external
/// side effects the async shell still owes. The state transition itself has
/// already happened by the time this is returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Reconciled {
    pub disposition: Disposition,
    /// Write-through for the shared tile cache.
    pub cache_write: Option<Tile>,
    /// The persisted colony tile list is stale and must be refreshed.
    pub invalidate_colony_list: bool,
    /// Display color of this controller should be resolved for rendering.
    pub lookup_color: Option<Uid>,
}

impl Reconciled {
    fn ignored() -> Reconciled {
        Reconciled {
            disposition: Disposition::Ignored,
            cache_write: None,
            invalidate_colony_list: false,
            lookup_color: None,
        }
    }
}

pub fn classify(
    state: &SyncState,
    current_uid: Option<&Uid>,
    tile: &Tile,
    show_all: bool,
) -> Disposition {
    // Hover previews are never authoritative, whatever they claim.
    if tile.is_preview {
        return Disposition::Ignored;
    }

    if let Some(uid) = current_uid {
        if tile.is_controlled_by(uid) {
            return Disposition::OwnTile;
        }
    }

    if state.is_colony(&tile.key) {
        if let Some(controller) = &tile.controller {
            if !controller.0.is_empty() && Some(controller) != current_uid {
                let previous_controller = state
                    .colony_tiles()
                    .get(&tile.key)
                    .and_then(|held| held.controller.clone());
                return Disposition::OpponentCapture {
                    previous_controller,
                };
            }
        }
    }

    if show_all || state.is_viewable(&tile.key) {
        return Disposition::ViewableUpdate;
    }

    Disposition::Ignored
}

/// Apply one tile update as a single state transition. Idempotent: replaying
/// an update reproduces the same state and the same owed effects.
pub fn apply(
    state: &mut SyncState,
    current_uid: Option<&Uid>,
    tile: Tile,
    show_all: bool,
) -> Reconciled {
    let disposition = classify(state, current_uid, &tile, show_all);
    let mut out = Reconciled::ignored();
    out.disposition = disposition;

    match &out.disposition {
        Disposition::OwnTile => {
            out.cache_write = Some(tile.clone());
            state.add_colony_tile(tile);
        }
        Disposition::OpponentCapture { .. } => {
            out.cache_write = Some(tile.clone());
            out.invalidate_colony_list = true;
            out.lookup_color = tile.controller.clone();
            state.remove_colony_tile(&tile.key);
        }
        Disposition::ViewableUpdate => {
            out.cache_write = Some(tile.clone());
            state.upsert_viewable(tile);
        }
        Disposition::Ignored => {}
    }

    out
}
