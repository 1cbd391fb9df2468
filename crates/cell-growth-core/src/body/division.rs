use super::{Body, ResolveReport};
use crate::angle::{angular_distance, normalize_angle, unit};
use crate::cell::{circle_radius, Cell, CellId};
use crate::config::DivisionParams;
use std::f64::consts::{FRAC_PI_2, PI};

/// Result of a division: the two children and the relaxation that followed.
#[derive(Clone, Debug, PartialEq)]
pub struct Division {
    pub left: CellId,
    pub right: CellId,
    pub resolve: ResolveReport,
}

/// Which children take over one of the parent's bonds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Heirs {
    Left,
    Right,
    Both,
}

/// Assign a parent bond to the children from its unsigned angular distance
/// `psi` to the left child's direction, given the split window `[w1, w2]`.
fn heirs_for(psi: f64, window: (f64, f64)) -> Heirs {
    if psi < window.0 {
        Heirs::Left
    } else if psi > window.1 {
        Heirs::Right
    } else {
        Heirs::Both
    }
}

/// Split window between the two children, in radians of distance from the
/// left child's direction.
///
/// `acos(1 - 2·left/size - bias)` is the edge of the left child's share of
/// the outline: the quarter turn for an even split, nearer the left direction
/// when the left child is smaller. Bonds between that edge and the division
/// axis (the quarter turn) are ambiguous, so the window spans both and grows
/// with the asymmetry of the split. `padding` widens it on either side.
fn split_window(left_size: f64, size: f64, bond_bias: f64, padding: f64) -> (f64, f64) {
    let share_edge = (1.0 - 2.0 * left_size / size - bond_bias)
        .clamp(-1.0, 1.0)
        .acos();
    let w1 = share_edge.min(FRAC_PI_2) - padding;
    let w2 = share_edge.max(FRAC_PI_2) + padding;
    (w1.max(0.0), w2.min(PI))
}

impl Body {
    /// Divide `parent` into two children and relax the neighbourhood.
    ///
    /// The children are appended to the body, inherit the parent's bonds and
    /// the parent is deactivated. Panics if `parent` is deactivated, has zero
    /// size, or `params` fail validation.
    pub fn divide(&mut self, parent: CellId, params: &DivisionParams) -> (CellId, CellId) {
        let division = self.divide_with_report(parent, params);
        (division.left, division.right)
    }

    pub fn divide_with_report(&mut self, parent: CellId, params: &DivisionParams) -> Division {
        if let Err(err) = params.validate() {
            panic!("invalid division parameters: {err}");
        }
        let p = self.cell(parent);
        assert!(p.active, "cell {parent} is deactivated and cannot divide");
        assert!(p.size() > 0.0, "cell {parent} has no size to divide");

        let size = p.size();
        let left_size = size * params.ratio / (1.0 + params.ratio);
        let right_size = size - left_size;
        let left_radius = circle_radius(left_size);
        let right_radius = circle_radius(right_size);
        let joint_radius = circle_radius(p.joint_size);

        let axis = p.world_angle(params.angle);
        let left_direction = axis + FRAC_PI_2;
        let normal = unit(left_direction);
        let left_reach = left_radius + joint_radius;
        let right_reach = right_radius + joint_radius;
        let left_position = [
            p.position[0] + normal[0] * left_reach,
            p.position[1] + normal[1] * left_reach,
        ];
        let right_position = [
            p.position[0] - normal[0] * right_reach,
            p.position[1] - normal[1] * right_reach,
        ];

        let (left_orientation, right_orientation) = if params.reorientate {
            (axis, axis)
        } else if params.mirror {
            // Reflecting the parent's frame across the world axis.
            (p.orientation, normalize_angle(2.0 * axis - p.orientation))
        } else {
            (p.orientation, p.orientation)
        };

        let mut left_cell = Cell::new(left_position, left_size)
            .with_orientation(left_orientation)
            .with_mirrored(p.mirrored)
            .with_joint_size(p.joint_size)
            .with_shape(p.shape);
        left_cell.right_side = false;
        let mut right_cell = Cell::new(right_position, right_size)
            .with_orientation(right_orientation)
            .with_mirrored(p.mirrored ^ params.mirror)
            .with_joint_size(p.joint_size)
            .with_shape(p.shape);
        right_cell.right_side = true;

        let left_local = p.local_angle(left_direction);
        let window = split_window(left_size, size, params.bond_bias, self.config.seam_half_width);

        let left = self.add_cell(left_cell);
        let right = self.add_cell(right_cell);
        if !params.suppress_bond {
            self.bond(left, right, true, 2.0 * joint_radius, Some(parent));
        }

        let inherited = std::mem::take(&mut self.cells[parent.index()].bonds);
        let mut former_neighbours = Vec::with_capacity(inherited.len());
        let mut counts = [0usize; 3];
        for bond in inherited {
            let far = bond.target;
            let reciprocal = self.remove_bond_to(far, parent);
            debug_assert!(
                reciprocal.is_some(),
                "bond {parent}->{far} had no reciprocal"
            );
            let heirs = heirs_for(angular_distance(bond.angle, left_local), window);
            // The far cell keeps its own side flag, so each child's flag is
            // the negation of the one the parent held.
            if matches!(heirs, Heirs::Left | Heirs::Both) {
                self.bond(far, left, bond.right_side, bond.offset, bond.joint_owner);
            }
            if matches!(heirs, Heirs::Right | Heirs::Both) {
                self.bond(far, right, bond.right_side, bond.offset, bond.joint_owner);
            }
            counts[heirs as usize] += 1;
            former_neighbours.push(far);
        }

        self.deactivate(parent);

        let seeds = [left, right].into_iter().chain(former_neighbours);
        let resolve = self.fix_overlap(seeds, self.config.division_precision);
        for &id in &resolve.affected {
            self.refresh_bond_angles(id);
        }

        log::debug!(
            "divided {parent} into {left} ({left_size:.3}) and {right} ({right_size:.3}); \
             bonds left={} right={} shared={}; relaxed {} cells in {} rounds",
            counts[Heirs::Left as usize],
            counts[Heirs::Right as usize],
            counts[Heirs::Both as usize],
            resolve.affected.len(),
            resolve.rounds,
        );

        Division {
            left,
            right,
            resolve,
        }
    }
}
