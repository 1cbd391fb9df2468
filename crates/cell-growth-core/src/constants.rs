use std::f64::consts::PI;

/// Default seam half-width (radians) of the bond split window used by division.
/// A bond whose angle lies within this distance of a seam touches both children.
pub const DEFAULT_SEAM_HALF_WIDTH: f64 = PI / 6.0;

/// Distances below this are treated as coincident centres.
pub const COINCIDENT_EPSILON: f64 = 1e-12;

/// Fixed clip on a single correction, in multiples of the moving cell's radius.
pub const MAX_DISPLACEMENT_RATIO: f64 = 2.0;
