//! Fog-of-war frontier expansion: multi-source BFS over cube coordinates.

use std::collections::{HashMap, HashSet};

use hexaverse_protocol::{CubeCoord, TileKey, TileMap};

/// A coordinate discovered during frontier expansion, annotated with its
/// minimum hex-step distance from the seed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontierTile {
    pub coord: CubeCoord,
    pub distance: u32,
}

/// All coordinates within `depth` steps of the owned set that are not
/// themselves owned. Distances are exact minima: BFS discovers every tile
/// first at its shortest layer, and overlapping expansions from disconnected
/// colony components resolve to the smaller distance for free.
pub fn viewable_frontier(owned: &TileMap, depth: u32) -> HashMap<TileKey, FrontierTile> {
    let visited = owned
        .values()
        .map(|tile| TileKey::from(tile.coord))
        .collect();
    expand(owned.values().map(|tile| tile.coord), visited, depth)
}

/// Single-seed expansion used by the incremental colony-tile add path.
pub fn expand_from(seed: CubeCoord, depth: u32) -> HashMap<TileKey, FrontierTile> {
    let visited = HashSet::from([TileKey::from(seed)]);
    expand([seed], visited, depth)
}

fn expand(
    seeds: impl IntoIterator<Item = CubeCoord>,
    mut visited: HashSet<TileKey>,
    depth: u32,
) -> HashMap<TileKey, FrontierTile> {
    let mut result = HashMap::new();
    let mut frontier: Vec<CubeCoord> = seeds.into_iter().collect();

    for distance in 1..=depth {
        let mut next = Vec::new();
        for coord in &frontier {
            for neighbor in coord.neighbors() {
                let key = TileKey::from(neighbor);
                if visited.insert(key.clone()) {
                    result.insert(
                        key,
                        FrontierTile {
                            coord: neighbor,
                            distance,
                        },
                    );
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    result
}
