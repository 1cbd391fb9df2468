use super::Body;
use crate::angle::{bearing, unit};
use crate::cell::{Bond, Cell, CellId};
use crate::config::{Precision, ResolverConfig};
use crate::constants::COINCIDENT_EPSILON;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Outcome of one [`Body::fix_overlap`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveReport {
    /// Every cell displaced during the call, in handle order. Their bond
    /// angles are stale until refreshed.
    pub affected: Vec<CellId>,
    /// Relaxation rounds that were evaluated.
    pub rounds: usize,
    /// False when the iteration cap stopped the call with cells still marked.
    pub converged: bool,
}

/// Next-round mass ratio of a cell from the agreement of its corrections.
///
/// `agreement` is `|Σ correction| / Σ |correction|`: 0 when the pushes cancel,
/// 1 when they all point the same way. The quadratic
/// `1/M + (M - 1/M)(1 - r)²` is monotonic on `[0, 1]` with `f(0) = M` and
/// `f(1) = 1/M`: a cell pushed in conflicting directions grows heavy and
/// stays put, a cell pushed consistently becomes light and moves freely.
pub fn mass_ratio(agreement: f64, max_mass_ratio: f64) -> f64 {
    debug_assert!(max_mass_ratio >= 1.0, "max_mass_ratio must be >= 1");
    debug_assert!(
        (-1e-9..=1.0 + 1e-9).contains(&agreement),
        "agreement {agreement} outside [0, 1]"
    );
    let r = agreement.clamp(0.0, 1.0);
    let min = 1.0 / max_mass_ratio;
    let ratio = min + (max_mass_ratio - min) * (1.0 - r).powi(2);
    debug_assert!(ratio >= min - 1e-12 && ratio <= max_mass_ratio + 1e-12);
    ratio
}

impl Body {
    /// Relax bonded cells around `marked` until every visited bond sits within
    /// tolerance or the precision's iteration cap is reached.
    ///
    /// Each round evaluates the bonds touching marked cells against the
    /// current positions. A cell on at least one bond that is out of
    /// tolerance moves by the mean of every correction its visited bonds ask
    /// for, weighted by the adaptive masses of the previous round. Cells on
    /// out-of-tolerance bonds form the next round's marked set. Deactivated
    /// handles are ignored.
    ///
    /// Positions change in place; bond angles are left untouched, so callers
    /// must refresh the angles of every cell in the returned report.
    pub fn fix_overlap<I>(&mut self, marked: I, precision: Precision) -> ResolveReport
    where
        I: IntoIterator<Item = CellId>,
    {
        let config = self.config.resolver(precision).clone();
        let mut marked: BTreeSet<CellId> = marked
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|c| c.active))
            .collect();

        let n = self.cells.len();
        self.delta_buffer.clear();
        self.delta_buffer.resize(n, [0.0; 2]);
        self.magnitude_buffer.clear();
        self.magnitude_buffer.resize(n, 0.0);
        self.contribution_buffer.clear();
        self.contribution_buffer.resize(n, 0);
        self.mass_ratio_buffer.clear();
        self.mass_ratio_buffer.resize(n, 1.0);

        let mut affected = BTreeSet::new();
        let mut touched: Vec<usize> = Vec::new();
        let mut previously_moved: Vec<usize> = Vec::new();
        let mut rounds = 0usize;

        while !marked.is_empty() && rounds < config.max_iterations {
            rounds += 1;
            let mut next = BTreeSet::new();
            let mut violated = 0usize;

            for &a in &marked {
                let cell_a = &self.cells[a.index()];
                for (k, bond) in cell_a.bonds.iter().enumerate() {
                    let b = bond.target;
                    // Bonds between two marked cells are visited from the lower handle.
                    if b < a && marked.contains(&b) {
                        continue;
                    }
                    let cell_b = &self.cells[b.index()];
                    debug_assert!(cell_b.active, "bond {a}->{b} reaches a deactivated cell");
                    let occurrence = cell_a.bonds[..k].iter().filter(|x| x.target == b).count();
                    let Some(reverse) = cell_b.bonds.iter().filter(|x| x.target == a).nth(occurrence)
                    else {
                        debug_assert!(false, "bond {a}->{b} has no reciprocal");
                        continue;
                    };
                    let masses = [
                        cell_a.size() * self.mass_ratio_buffer[a.index()],
                        cell_b.size() * self.mass_ratio_buffer[b.index()],
                    ];
                    let correction = bond_correction(cell_a, cell_b, bond, reverse, masses, &config);
                    if correction.violated {
                        violated += 1;
                        next.insert(a);
                        next.insert(b);
                    }
                    let [move_a, move_b] = correction.moves;
                    for (idx, step) in [(a.index(), move_a), (b.index(), move_b)] {
                        if self.contribution_buffer[idx] == 0 {
                            touched.push(idx);
                        }
                        self.contribution_buffer[idx] += 1;
                        self.delta_buffer[idx][0] += step[0];
                        self.delta_buffer[idx][1] += step[1];
                        self.magnitude_buffer[idx] += norm(step);
                    }
                }
            }

            for &idx in &previously_moved {
                self.mass_ratio_buffer[idx] = 1.0;
            }
            previously_moved.clear();
            for &idx in &touched {
                let delta = self.delta_buffer[idx];
                let magnitude = self.magnitude_buffer[idx];
                let contributions = self.contribution_buffer[idx];
                self.delta_buffer[idx] = [0.0; 2];
                self.magnitude_buffer[idx] = 0.0;
                self.contribution_buffer[idx] = 0;

                // Cells whose bonds all sit within tolerance stay put.
                let id = CellId(idx as u32);
                if !next.contains(&id) || magnitude <= 0.0 {
                    continue;
                }
                let step = scale(delta, 1.0 / contributions as f64);
                let cell = &mut self.cells[idx];
                cell.position = add(cell.position, step);
                if step != [0.0; 2] {
                    affected.insert(id);
                }
                let agreement = (norm(delta) / magnitude).min(1.0);
                self.mass_ratio_buffer[idx] = mass_ratio(agreement, config.max_mass_ratio);
                previously_moved.push(idx);
            }
            log::trace!(
                "overlap round {rounds}: {violated} bonds out of tolerance, {} cells moved",
                previously_moved.len()
            );
            touched.clear();
            marked = next;
        }

        let converged = marked.is_empty();
        if !converged {
            log::debug!(
                "overlap resolver gave up after {rounds} rounds with {} cells still marked",
                marked.len()
            );
        }
        ResolveReport {
            affected: affected.into_iter().collect(),
            rounds,
            converged,
        }
    }
}

/// Corrections one bond pair asks of its two cells.
struct BondCorrection {
    moves: [[f64; 2]; 2],
    /// Whether either constraint is out of tolerance at the current positions.
    violated: bool,
}

/// Corrections closing both constraints of one bond pair.
///
/// The centre-distance correction is computed first; the anchor correction is
/// then computed on the positions that correction would produce, so the two
/// do not both close the same radial error. Corrections are returned for
/// bonds within tolerance too: a cell that has to move anyway averages them
/// with its violated bonds instead of breaking them.
fn bond_correction(
    a: &Cell,
    b: &Cell,
    forward: &Bond,
    reverse: &Bond,
    masses: [f64; 2],
    config: &ResolverConfig,
) -> BondCorrection {
    let (pa, pb) = (a.position, b.position);
    let distance = norm(sub(pb, pa));
    let axis = if distance > COINCIDENT_EPSILON {
        bearing(pa, pb)
    } else {
        a.world_angle(forward.angle)
    };
    let ra = a.radius_towards(axis);
    let rb = b.radius_towards(axis + PI);
    let tolerance = config.tolerance_factor * ra.min(rb);

    // Each cell moves by the other's share of the combined mass.
    let total = masses[0] + masses[1];
    let (share_a, share_b) = if total > 0.0 {
        (masses[1] / total, masses[0] / total)
    } else {
        (0.5, 0.5)
    };
    let limit_a = config.max_displacement_ratio * ra;
    let limit_b = config.max_displacement_ratio * rb;

    let deviation = distance - (ra + rb + forward.offset);
    let u = unit(axis);
    let mut move_a = clip(scale(u, deviation * share_a), limit_a);
    let mut move_b = clip(scale(u, -deviation * share_b), limit_b);

    let anchor_gap = norm(sub(anchor(b, pb, reverse), anchor(a, pa, forward)));
    let violated = deviation.abs() > tolerance || anchor_gap > tolerance;

    let gap = sub(anchor(b, add(pb, move_b), reverse), anchor(a, add(pa, move_a), forward));
    move_a = add(move_a, clip(scale(gap, share_a), limit_a));
    move_b = add(move_b, clip(scale(gap, -share_b), limit_b));

    BondCorrection {
        moves: [clip(move_a, limit_a), clip(move_b, limit_b)],
        violated,
    }
}

/// World position of a bond's joint on `cell` when centred at `centre`.
fn anchor(cell: &Cell, centre: [f64; 2], bond: &Bond) -> [f64; 2] {
    let reach = cell.radius(bond.angle) + bond.offset / 2.0;
    add(centre, scale(unit(cell.world_angle(bond.angle)), reach))
}

fn add(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

fn scale(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}

fn norm(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

fn clip(v: [f64; 2], limit: f64) -> [f64; 2] {
    let len = norm(v);
    if len > limit && len > 0.0 {
        scale(v, limit / len)
    } else {
        v
    }
}
