use crate::angle::bearing;
use crate::body::Body;
use crate::cell::CellId;
use rstar::{RTree, RTreeObject, AABB};
use std::f64::consts::PI;

/// Lightweight position-only entry for spatial indexing of live cells.
#[derive(Clone, Debug)]
pub struct CellLocation {
    pub id: CellId,
    pub position: [f64; 2],
}

impl RTreeObject for CellLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Build an R*-tree over the centres of all live cells via bulk_load.
pub fn build_index(body: &Body) -> RTree<CellLocation> {
    let locations: Vec<CellLocation> = body
        .live_cells()
        .map(|(id, c)| CellLocation {
            id,
            position: c.position,
        })
        .collect();
    RTree::bulk_load(locations)
}

/// Live cells whose centre lies within `radius` of `center`, sorted by handle.
pub fn query_cells_within(
    tree: &RTree<CellLocation>,
    center: [f64; 2],
    radius: f64,
    exclude: Option<CellId>,
) -> Vec<CellId> {
    assert!(
        radius.is_finite() && radius >= 0.0,
        "radius must be non-negative and finite"
    );
    let envelope = AABB::from_corners(
        [center[0] - radius, center[1] - radius],
        [center[0] + radius, center[1] + radius],
    );
    let r_sq = radius * radius;
    let mut result: Vec<CellId> = tree
        .locate_in_envelope(&envelope)
        .filter(|loc| Some(loc.id) != exclude)
        .filter(|loc| {
            let dx = loc.position[0] - center[0];
            let dy = loc.position[1] - center[1];
            dx * dx + dy * dy <= r_sq
        })
        .map(|loc| loc.id)
        .collect();
    result.sort_unstable();
    result
}

/// Live cell pairs whose outlines overlap although no bond links them.
///
/// Bonded cells are kept apart by the overlap resolver; unbonded ones are
/// not, so this is where collisions between distant branches show up.
pub fn find_unbonded_overlaps(body: &Body) -> Vec<(CellId, CellId)> {
    let tree = build_index(body);
    let max_reach = body
        .live_cells()
        .map(|(_, c)| c.max_radius())
        .fold(0.0, f64::max);

    let mut pairs = Vec::new();
    for (id, cell) in body.live_cells() {
        let reach = cell.max_radius() + max_reach;
        for other in query_cells_within(&tree, cell.position, reach, Some(id)) {
            if other < id || cell.is_bonded_to(other) {
                continue;
            }
            let other_cell = body.cell(other);
            let axis = bearing(cell.position, other_cell.position);
            let contact = cell.radius_towards(axis) + other_cell.radius_towards(axis + PI);
            let dx = other_cell.position[0] - cell.position[0];
            let dy = other_cell.position[1] - cell.position[1];
            if (dx * dx + dy * dy).sqrt() < contact {
                pairs.push((id, other));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn query_finds_cells_within_radius() {
        let mut body = Body::default();
        let a = body.add_cell(Cell::new([5.0, 5.0], 1.0));
        let b = body.add_cell(Cell::new([6.0, 5.0], 1.0));
        body.add_cell(Cell::new([50.0, 50.0], 1.0));
        let tree = build_index(&body);
        assert_eq!(query_cells_within(&tree, [5.0, 5.0], 2.0, None), vec![a, b]);
    }

    #[test]
    fn query_excludes_requested_cell() {
        let mut body = Body::default();
        let a = body.add_cell(Cell::new([5.0, 5.0], 1.0));
        let b = body.add_cell(Cell::new([6.0, 5.0], 1.0));
        let tree = build_index(&body);
        assert_eq!(query_cells_within(&tree, [5.0, 5.0], 2.0, Some(a)), vec![b]);
    }

    #[test]
    fn index_skips_deactivated_cells() {
        let mut body = Body::default();
        let a = body.add_cell(Cell::new([0.0, 0.0], 1.0));
        let b = body.add_cell(Cell::new([0.5, 0.0], 1.0));
        body.deactivate(a);
        let tree = build_index(&body);
        assert_eq!(query_cells_within(&tree, [0.0, 0.0], 5.0, None), vec![b]);
    }

    #[test]
    fn unbonded_overlaps_ignore_bonded_and_distant_pairs() {
        let mut body = Body::default();
        let a = body.add_cell(Cell::new([0.0, 0.0], 1.0));
        let b = body.add_cell(Cell::new([0.5, 0.0], 1.0));
        let c = body.add_cell(Cell::new([0.0, 0.5], 1.0));
        body.add_cell(Cell::new([30.0, 0.0], 1.0));
        body.bond(a, b, true, 0.0, None);

        // a-c and b-c overlap without a bond; a-b is bonded.
        assert_eq!(find_unbonded_overlaps(&body), vec![(a, c), (b, c)]);
    }
}
