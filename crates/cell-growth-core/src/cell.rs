use crate::angle::{angle_difference, normalize_angle};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Stable handle of a cell inside a [`crate::body::Body`].
///
/// Handles are never reused: a deactivated cell keeps its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outline of a cell as a function of the cell-local angle.
#[derive(Clone, Copy, Debug, Default)]
pub enum Shape {
    /// Circular cross-section, radius `√(size/π)`.
    #[default]
    Circle,
    /// Area-preserving ellipse whose major axis lies along local angle 0.
    /// `aspect` is major/minor and must be ≥ 1.
    Ellipse { aspect: f64 },
    /// Arbitrary outline: `f(size, local_angle) -> radius`.
    Custom(fn(f64, f64) -> f64),
}

impl Shape {
    pub fn radius(&self, size: f64, local_angle: f64) -> f64 {
        match *self {
            Shape::Circle => circle_radius(size),
            Shape::Ellipse { aspect } => {
                debug_assert!(aspect >= 1.0, "ellipse aspect must be >= 1");
                let minor = (size / (PI * aspect)).sqrt();
                let major = aspect * minor;
                let (sin, cos) = local_angle.sin_cos();
                let denom = ((minor * cos).powi(2) + (major * sin).powi(2)).sqrt();
                if denom > 0.0 {
                    major * minor / denom
                } else {
                    0.0
                }
            }
            Shape::Custom(f) => f(size, local_angle),
        }
    }

    /// Largest outline distance from the centre. Custom outlines are sampled.
    pub fn max_radius(&self, size: f64) -> f64 {
        match *self {
            Shape::Circle => circle_radius(size),
            Shape::Ellipse { aspect } => aspect * (size / (PI * aspect)).sqrt(),
            Shape::Custom(f) => (0..CUSTOM_SHAPE_SAMPLES)
                .map(|i| f(size, TAU * i as f64 / CUSTOM_SHAPE_SAMPLES as f64))
                .fold(0.0, f64::max),
        }
    }
}

const CUSTOM_SHAPE_SAMPLES: usize = 64;

/// Radius of a circle with the given area.
pub fn circle_radius(size: f64) -> f64 {
    (size / PI).sqrt()
}

/// Directed view of a structural relation held by the owning cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Bond {
    pub target: CellId,
    /// Bearing to `target` in the owner's local frame, captured when the bond
    /// was created or last refreshed. Not updated when either cell moves.
    pub angle: f64,
    /// Joint diameter: gap kept between the two outlines.
    pub offset: f64,
    pub right_side: bool,
    /// Cell whose division created this joint.
    pub joint_owner: Option<CellId>,
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub position: [f64; 2],
    /// World-space orientation in `[0, 2π)`.
    pub orientation: f64,
    /// Flips the sign convention of local↔world angle conversion.
    pub mirrored: bool,
    /// Whether this cell was the right product of its parent's division.
    pub right_side: bool,
    /// Area used to size the joint between this cell's children.
    pub joint_size: f64,
    pub shape: Shape,
    size: f64,
    pub(crate) bonds: Vec<Bond>,
    pub(crate) active: bool,
}

impl Cell {
    pub fn new(position: [f64; 2], size: f64) -> Self {
        assert!(size.is_finite() && size >= 0.0, "cell size must be finite and non-negative");
        Self {
            position,
            orientation: 0.0,
            mirrored: false,
            right_side: false,
            joint_size: 0.0,
            shape: Shape::Circle,
            size,
            bonds: Vec::new(),
            active: true,
        }
    }

    pub fn with_orientation(mut self, orientation: f64) -> Self {
        self.orientation = normalize_angle(orientation);
        self
    }

    pub fn with_mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn with_joint_size(mut self, joint_size: f64) -> Self {
        assert!(
            joint_size.is_finite() && joint_size >= 0.0,
            "joint size must be finite and non-negative"
        );
        self.joint_size = joint_size;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Outline distance from the centre at a cell-local angle.
    pub fn radius(&self, local_angle: f64) -> f64 {
        self.shape.radius(self.size, local_angle)
    }

    pub fn max_radius(&self) -> f64 {
        self.shape.max_radius(self.size)
    }

    /// Outline distance from the centre towards a world-space direction.
    pub fn radius_towards(&self, world_angle: f64) -> f64 {
        self.radius(self.local_angle(world_angle))
    }

    fn sign(&self) -> f64 {
        if self.mirrored {
            -1.0
        } else {
            1.0
        }
    }

    pub fn world_angle(&self, local_angle: f64) -> f64 {
        normalize_angle(self.orientation + local_angle * self.sign())
    }

    pub fn local_angle(&self, world_angle: f64) -> f64 {
        normalize_angle(angle_difference(self.orientation, world_angle) * self.sign())
    }

    pub fn is_bonded_to(&self, other: CellId) -> bool {
        self.bonds.iter().any(|b| b.target == other)
    }
}
