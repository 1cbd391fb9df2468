use crate::angle::{bearing, normalize_angle};
use crate::cell::{Bond, Cell, CellId};
use crate::config::{GrowthConfig, GrowthConfigError};
use std::f64::consts::PI;

mod division;
mod growth;
mod overlap;

pub use division::Division;
pub use overlap::{mass_ratio, ResolveReport};

/// Arena of cells and the bond graph between them.
///
/// Cells are addressed by [`CellId`] handles that stay valid for the lifetime
/// of the body. Division appends two children and deactivates the parent in
/// place; deactivated cells are skipped by every live-cell query.
pub struct Body {
    cells: Vec<Cell>,
    config: GrowthConfig,
    live_count: usize,

    // Scratch buffers reused across resolver calls, indexed by cell slot.
    delta_buffer: Vec<[f64; 2]>,
    magnitude_buffer: Vec<f64>,
    contribution_buffer: Vec<usize>,
    mass_ratio_buffer: Vec<f64>,
}

impl Default for Body {
    fn default() -> Self {
        Self::with_config(GrowthConfig::default())
    }
}

impl Body {
    pub const MAX_CELLS: usize = u32::MAX as usize;

    pub fn new(config: GrowthConfig) -> Result<Self, GrowthConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: GrowthConfig) -> Self {
        Self {
            cells: Vec::new(),
            config,
            live_count: 0,
            delta_buffer: Vec::new(),
            magnitude_buffer: Vec::new(),
            contribution_buffer: Vec::new(),
            mass_ratio_buffer: Vec::new(),
        }
    }

    /// Body holding a single seed cell at the origin, sized from the config.
    pub fn seeded(config: GrowthConfig) -> Result<(Self, CellId), GrowthConfigError> {
        let mut body = Self::new(config)?;
        let seed = Cell::new([0.0, 0.0], body.config.seed_size)
            .with_joint_size(body.config.seed_joint_size);
        let id = body.add_cell(seed);
        Ok((body, id))
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GrowthConfig) -> Result<(), GrowthConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Insert a new live cell. Bonds on the incoming cell are discarded.
    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        assert!(self.cells.len() < Self::MAX_CELLS, "cell arena is full");
        let id = CellId(self.cells.len() as u32);
        cell.bonds.clear();
        cell.active = true;
        cell.orientation = normalize_angle(cell.orientation);
        self.cells.push(cell);
        self.live_count += 1;
        id
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// Panics on a handle that does not belong to this body.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    /// Mutable access for the body model (e.g. physics moving cells).
    /// Callers that move a cell must refresh the bond angles afterwards.
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    /// Number of slots, live or deactivated.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn live_cells(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active)
            .map(|(i, c)| (CellId(i as u32), c))
    }

    /// Create a symmetric bond pair between `a` and `b`.
    ///
    /// `a` stores the bearing to `b` in its local frame with `right_side`;
    /// `b` stores the reverse bearing with the side flag negated.
    pub fn bond(
        &mut self,
        a: CellId,
        b: CellId,
        right_side: bool,
        joint_diameter: f64,
        joint_owner: Option<CellId>,
    ) {
        assert_ne!(a, b, "a cell cannot bond to itself");
        assert!(
            joint_diameter.is_finite() && joint_diameter >= 0.0,
            "joint diameter must be finite and non-negative"
        );
        let (cell_a, cell_b) = (self.cell(a), self.cell(b));
        assert!(
            cell_a.active && cell_b.active,
            "deactivated cells cannot be bonded"
        );
        let forward = bearing(cell_a.position, cell_b.position);
        let backward = normalize_angle(forward + PI);
        let angle_a = cell_a.local_angle(forward);
        let angle_b = cell_b.local_angle(backward);

        self.cells[a.index()].bonds.push(Bond {
            target: b,
            angle: angle_a,
            offset: joint_diameter,
            right_side,
            joint_owner,
        });
        self.cells[b.index()].bonds.push(Bond {
            target: a,
            angle: angle_b,
            offset: joint_diameter,
            right_side: !right_side,
            joint_owner,
        });
    }

    /// Remove one bond pair between `a` and `b`. Returns whether one existed.
    pub fn unbond(&mut self, a: CellId, b: CellId) -> bool {
        let Some(forward) = self.remove_bond_to(a, b) else {
            return false;
        };
        let backward = self.remove_bond_to(b, a);
        debug_assert!(
            backward.is_some(),
            "bond {a}->{b} had no reciprocal (offset {})",
            forward.offset
        );
        true
    }

    /// Remove the first bond `owner` holds towards `target`, keeping order.
    pub(crate) fn remove_bond_to(&mut self, owner: CellId, target: CellId) -> Option<Bond> {
        let bonds = &mut self.cells[owner.index()].bonds;
        let pos = bonds.iter().position(|b| b.target == target)?;
        Some(bonds.remove(pos))
    }

    /// Recompute every outgoing bond angle of `id` from current positions.
    pub fn refresh_bond_angles(&mut self, id: CellId) {
        let mut bonds = std::mem::take(&mut self.cells[id.index()].bonds);
        {
            let cell = &self.cells[id.index()];
            for bond in &mut bonds {
                let target = &self.cells[bond.target.index()];
                bond.angle = cell.local_angle(bearing(cell.position, target.position));
            }
        }
        self.cells[id.index()].bonds = bonds;
    }

    /// Strike a cell from the live graph. The cell must hold no bonds.
    pub fn deactivate(&mut self, id: CellId) {
        let cell = &mut self.cells[id.index()];
        assert!(cell.active, "cell {id} is already deactivated");
        assert!(
            cell.bonds.is_empty(),
            "cell {id} still holds {} bonds",
            cell.bonds.len()
        );
        cell.active = false;
        self.live_count -= 1;
    }

    /// Every bond pair once, seen from its lower handle.
    pub fn bond_pairs(&self) -> impl Iterator<Item = (CellId, &Bond)> + '_ {
        self.live_cells().flat_map(|(id, cell)| {
            cell.bonds
                .iter()
                .filter(move |bond| id < bond.target)
                .map(move |bond| (id, bond))
        })
    }

    /// Whether every bond has a reciprocal with the negated side flag, and no
    /// bond touches a deactivated cell.
    pub fn bond_graph_is_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(i, cell)| {
            if !cell.active {
                return cell.bonds.is_empty();
            }
            let id = CellId(i as u32);
            cell.bonds.iter().all(|bond| {
                let Some(other) = self.cells.get(bond.target.index()) else {
                    return false;
                };
                let outgoing = cell
                    .bonds
                    .iter()
                    .filter(|b| b.target == bond.target)
                    .count();
                let incoming = other.bonds.iter().filter(|b| b.target == id).count();
                let mirrored = other
                    .bonds
                    .iter()
                    .any(|b| b.target == id && b.right_side != bond.right_side);
                other.active && outgoing == incoming && mirrored
            })
        })
    }

    /// Relative deviation of a bond pair from its rest distance:
    /// `|distance - desired| / min(radius_a, radius_b)`.
    pub fn bond_deviation(&self, a: CellId, b: CellId, offset: f64) -> f64 {
        let (cell_a, cell_b) = (self.cell(a), self.cell(b));
        let axis = bearing(cell_a.position, cell_b.position);
        let ra = cell_a.radius_towards(axis);
        let rb = cell_b.radius_towards(axis + PI);
        let dx = cell_b.position[0] - cell_a.position[0];
        let dy = cell_b.position[1] - cell_a.position[1];
        let distance = (dx * dx + dy * dy).sqrt();
        let scale = ra.min(rb);
        if scale > 0.0 {
            (distance - (ra + rb + offset)).abs() / scale
        } else {
            0.0
        }
    }
}
