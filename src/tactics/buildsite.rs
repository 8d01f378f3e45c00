use crate::grid::Grid;
use crate::host::{Direction, Position};
use crate::pathing::PathingMap;
use itertools::Itertools;
use pathfinding::prelude::connected_components;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Resource tiles this close (chebyshev) belong to the same cluster.
const CLUSTER_LINK_DISTANCE: u32 = 2;

/// Adjacent tile to spawn a unit on. Resource tiles are used only when nothing
/// else is free; among the rest the tile nearest `prefer` wins.
pub fn select_build_site(origin: Position, map: &PathingMap, resources: &Grid<bool>, prefer: Option<Position>) -> Option<Position> {
    Direction::ALL
        .iter()
        .map(|d| {
            let (dx, dy) = d.delta();
            origin.offset(dx, dy)
        })
        .filter(|tile| map.is_open(*tile, false))
        .min_by_key(|tile| (resources.is_set(*tile), prefer.map(|p| tile.distance_sq(p)).unwrap_or(0)))
}

/// Tile for a new church: next to the richest resource cluster that no
/// existing dropoff already serves. Ties go to the site nearer `from`.
pub fn select_church_site(
    from: Position,
    resources: &Grid<bool>,
    map: &PathingMap,
    dropoffs: &[Position],
    radius_sq: u32,
    served_distance_sq: u32,
) -> Option<Position> {
    church_site_candidates(resources, map, dropoffs, radius_sq, served_distance_sq)
        .into_iter()
        .min_by_key(|(site, nearby)| (Reverse(*nearby), site.distance_sq(from), site.y, site.x))
        .map(|(site, _)| site)
}

/// Every open tile within `radius_sq` of an unserved resource cluster, with
/// the number of resource tiles it would serve.
pub fn church_site_candidates(
    resources: &Grid<bool>,
    map: &PathingMap,
    dropoffs: &[Position],
    radius_sq: u32,
    served_distance_sq: u32,
) -> Vec<(Position, usize)> {
    let tiles: Vec<Position> = resources.iter().filter(|(_, set)| **set).map(|(pos, _)| pos).collect();
    let link = CLUSTER_LINK_DISTANCE as i32;

    let clusters = connected_components(&tiles, |pos: &Position| {
        let pos = *pos;

        (-link..=link)
            .cartesian_product(-link..=link)
            .map(move |(dx, dy)| pos.offset(dx, dy))
            .filter(|p| resources.is_set(*p))
            .collect::<Vec<_>>()
    });

    let unserved = clusters.into_iter().filter(|cluster: &HashSet<Position>| {
        !cluster
            .iter()
            .any(|tile| dropoffs.iter().any(|d| d.distance_sq(*tile) <= served_distance_sq))
    });

    let reach = (radius_sq as f64).sqrt() as i32;

    unserved
        .flat_map(|cluster| {
            cluster
                .iter()
                .flat_map(|tile| {
                    (-reach..=reach)
                        .cartesian_product(-reach..=reach)
                        .map(move |(dx, dy)| tile.offset(dx, dy))
                })
                .collect::<HashSet<_>>()
        })
        .unique()
        .filter(|site| !resources.is_set(*site) && map.is_open(*site, false))
        .map(|site| {
            let nearby = tiles.iter().filter(|t| t.distance_sq(site) <= radius_sq).count();
            (site, nearby)
        })
        .filter(|(_, nearby)| *nearby > 0)
        .sorted_by_key(|(site, _)| (site.y, site.x))
        .collect()
}
