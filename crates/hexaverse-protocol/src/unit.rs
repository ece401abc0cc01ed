use serde::{Deserialize, Serialize};

use crate::{CubeCoord, Uid, UnitId};

/// The closed set of unit kinds a colony can field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Unit {
    Ship {
        id: UnitId,
        owner: Uid,
        position: CubeCoord,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        destination: Option<CubeCoord>,
    },
    Base {
        id: UnitId,
        owner: Uid,
        position: CubeCoord,
        #[serde(default)]
        level: u8,
    },
    MiningSite {
        id: UnitId,
        owner: Uid,
        position: CubeCoord,
        resource: String,
        #[serde(default)]
        rate: f64,
    },
    ResearchSite {
        id: UnitId,
        owner: Uid,
        position: CubeCoord,
        discipline: String,
    },
}

impl Unit {
    pub fn id(&self) -> &UnitId {
        match self {
            Unit::Ship { id, .. }
            | Unit::Base { id, .. }
            | Unit::MiningSite { id, .. }
            | Unit::ResearchSite { id, .. } => id,
        }
    }

    pub fn owner(&self) -> &Uid {
        match self {
            Unit::Ship { owner, .. }
            | Unit::Base { owner, .. }
            | Unit::MiningSite { owner, .. }
            | Unit::ResearchSite { owner, .. } => owner,
        }
    }

    pub fn position(&self) -> CubeCoord {
        match self {
            Unit::Ship { position, .. }
            | Unit::Base { position, .. }
            | Unit::MiningSite { position, .. }
            | Unit::ResearchSite { position, .. } => *position,
        }
    }
}
