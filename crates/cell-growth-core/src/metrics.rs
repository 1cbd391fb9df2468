use crate::body::Body;
use serde::{Deserialize, Serialize};

/// Aggregates over a run of random divisions.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct GrowthStats {
    pub divisions: usize,
    /// Resolver rounds summed over every division.
    pub resolver_rounds: usize,
    /// Divisions whose relaxation hit the iteration cap.
    pub capped_resolves: usize,
    /// Cells displaced, summed over every division.
    pub displaced_cells: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub orientation: f64,
    pub size: f64,
    pub mirrored: bool,
    pub right_side: bool,
    pub bond_count: usize,
}

/// Read-only view of the live part of a body, for display and reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub live_count: usize,
    pub total_size: f64,
    pub cells: Vec<CellSnapshot>,
    /// Undirected bonds as `[low, high]` handle pairs.
    pub bonds: Vec<[u32; 2]>,
    /// Mean of `|distance - rest| / min radius` over all bonds.
    pub mean_bond_deviation: f64,
    pub max_bond_deviation: f64,
}

impl BodySnapshot {
    pub fn capture(body: &Body) -> Self {
        let cells: Vec<CellSnapshot> = body
            .live_cells()
            .map(|(id, c)| CellSnapshot {
                id: id.index() as u32,
                x: c.position[0],
                y: c.position[1],
                orientation: c.orientation,
                size: c.size(),
                mirrored: c.mirrored,
                right_side: c.right_side,
                bond_count: c.bonds().len(),
            })
            .collect();
        let total_size = cells.iter().map(|c| c.size).sum();

        let mut bonds = Vec::new();
        let mut deviation_sum = 0.0;
        let mut max_bond_deviation = 0.0f64;
        for (id, bond) in body.bond_pairs() {
            let deviation = body.bond_deviation(id, bond.target, bond.offset);
            deviation_sum += deviation;
            max_bond_deviation = max_bond_deviation.max(deviation);
            bonds.push([id.index() as u32, bond.target.index() as u32]);
        }
        let mean_bond_deviation = if bonds.is_empty() {
            0.0
        } else {
            deviation_sum / bonds.len() as f64
        };

        Self {
            live_count: body.live_count(),
            total_size,
            cells,
            bonds,
            mean_bond_deviation,
            max_bond_deviation,
        }
    }
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrowthSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seed: u64,
    pub divisions_requested: usize,
    pub stats: GrowthStats,
    /// Live, unbonded cell pairs whose outlines overlap.
    #[serde(default)]
    pub unbonded_overlaps: Vec<[u32; 2]>,
    pub snapshot: BodySnapshot,
}
