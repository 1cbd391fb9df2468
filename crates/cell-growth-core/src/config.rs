use crate::constants::{DEFAULT_SEAM_HALF_WIDTH, MAX_DISPLACEMENT_RATIO};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Resolver precision preset.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Normal,
    /// Tighter tolerance and a much higher iteration cap.
    Extra,
}

/// Tuning of the overlap resolver for one precision level.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Allowed constraint deviation as a fraction of the smaller radius of a bond.
    pub tolerance_factor: f64,
    /// Clip on a single correction, in multiples of the moving cell's radius.
    pub max_displacement_ratio: f64,
    /// Upper bound of the adaptive mass ratio; its reciprocal is the lower bound.
    pub max_mass_ratio: f64,
    /// Hard cap on relaxation rounds per call.
    pub max_iterations: usize,
}

impl ResolverConfig {
    pub fn normal() -> Self {
        Self {
            tolerance_factor: 0.10,
            max_displacement_ratio: MAX_DISPLACEMENT_RATIO,
            max_mass_ratio: 20.0,
            max_iterations: 20,
        }
    }

    pub fn extra_precision() -> Self {
        Self {
            tolerance_factor: 0.02,
            max_displacement_ratio: MAX_DISPLACEMENT_RATIO,
            max_mass_ratio: 10.0,
            max_iterations: 500,
        }
    }

    pub fn validate(&self) -> Result<(), GrowthConfigError> {
        if !(self.tolerance_factor.is_finite() && self.tolerance_factor > 0.0) {
            return Err(GrowthConfigError::InvalidToleranceFactor);
        }
        if !(self.max_displacement_ratio.is_finite() && self.max_displacement_ratio > 0.0) {
            return Err(GrowthConfigError::InvalidMaxDisplacementRatio);
        }
        if !(self.max_mass_ratio.is_finite() && self.max_mass_ratio >= 1.0) {
            return Err(GrowthConfigError::InvalidMaxMassRatio);
        }
        if self.max_iterations == 0 {
            return Err(GrowthConfigError::InvalidMaxIterations);
        }
        if self.max_iterations > Self::MAX_ITERATIONS_LIMIT {
            return Err(GrowthConfigError::TooManyIterations {
                max: Self::MAX_ITERATIONS_LIMIT,
                actual: self.max_iterations,
            });
        }
        Ok(())
    }

    pub const MAX_ITERATIONS_LIMIT: usize = 100_000;
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::normal()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrowthConfig {
    /// Deterministic seed for random growth runs.
    pub seed: u64,
    /// Area of the seed cell a body starts from.
    pub seed_size: f64,
    /// Joint size given to the seed cell and inherited by its descendants.
    pub seed_joint_size: f64,
    /// Resolver tuning used for `Precision::Normal`.
    pub normal: ResolverConfig,
    /// Resolver tuning used for `Precision::Extra`.
    pub extra_precision: ResolverConfig,
    /// Precision of the relaxation that follows each division.
    pub division_precision: Precision,
    /// Half-width (radians) of the split window around each division seam.
    pub seam_half_width: f64,
    /// Children smaller than this are not divided again by random growth.
    pub min_division_size: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            seed_size: 16.0,
            seed_joint_size: 0.05,
            normal: ResolverConfig::normal(),
            extra_precision: ResolverConfig::extra_precision(),
            division_precision: Precision::Normal,
            seam_half_width: DEFAULT_SEAM_HALF_WIDTH,
            min_division_size: 0.1,
        }
    }
}

macro_rules! define_config_error {
    (
        $name:ident;
        $(
            $variant:ident $( { $($field:ident : $type:ty),* } )? => $fmt:literal $(, $arg:expr)*
        );* $(;)?
    ) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $(
                $variant $( { $($field : $type),* } )?,
            )*
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$variant $( { $($field),* } )? => write!(f, $fmt $(, $arg)*),
                    )*
                }
            }
        }

        impl std::error::Error for $name {}
    };
}

define_config_error! {
    GrowthConfigError;
    InvalidToleranceFactor => "tolerance_factor must be positive and finite";
    InvalidMaxDisplacementRatio => "max_displacement_ratio must be positive and finite";
    InvalidMaxMassRatio => "max_mass_ratio must be finite and >= 1";
    InvalidMaxIterations => "max_iterations must be positive";
    TooManyIterations { max: usize, actual: usize } => "max_iterations ({actual}) exceeds supported maximum ({max})";
    InvalidSeedSize => "seed_size must be positive and finite";
    InvalidSeedJointSize => "seed_joint_size must be finite and non-negative";
    InvalidSeamHalfWidth => "seam_half_width must be finite and within [0, pi/2]";
    InvalidMinDivisionSize => "min_division_size must be finite and non-negative";
}

define_config_error! {
    DivisionParamsError;
    InvalidAngle => "angle must be finite and within [0, pi)";
    InvalidRatio => "ratio must be positive and finite";
    InvalidBondBias => "bond_bias must be finite";
}

impl GrowthConfig {
    pub fn validate(&self) -> Result<(), GrowthConfigError> {
        self.normal.validate()?;
        self.extra_precision.validate()?;
        if !(self.seed_size.is_finite() && self.seed_size > 0.0) {
            return Err(GrowthConfigError::InvalidSeedSize);
        }
        if !(self.seed_joint_size.is_finite() && self.seed_joint_size >= 0.0) {
            return Err(GrowthConfigError::InvalidSeedJointSize);
        }
        if !(self.seam_half_width.is_finite() && (0.0..=PI / 2.0).contains(&self.seam_half_width))
        {
            return Err(GrowthConfigError::InvalidSeamHalfWidth);
        }
        if !(self.min_division_size.is_finite() && self.min_division_size >= 0.0) {
            return Err(GrowthConfigError::InvalidMinDivisionSize);
        }
        Ok(())
    }

    pub fn resolver(&self, precision: Precision) -> &ResolverConfig {
        match precision {
            Precision::Normal => &self.normal,
            Precision::Extra => &self.extra_precision,
        }
    }
}

/// Parameters of one division, normally decoded from a genome by the caller.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DivisionParams {
    /// Division axis in the parent's local frame, within `[0, π)`.
    pub angle: f64,
    /// Size ratio left:right.
    pub ratio: f64,
    /// Shifts the seam of the bond split window towards one child.
    pub bond_bias: f64,
    /// Align both children with the division axis.
    pub reorientate: bool,
    /// Reflect the right child across the division axis.
    pub mirror: bool,
    /// Skip the bond between the two children.
    pub suppress_bond: bool,
}

impl Default for DivisionParams {
    fn default() -> Self {
        Self {
            angle: 0.0,
            ratio: 1.0,
            bond_bias: 0.0,
            reorientate: false,
            mirror: false,
            suppress_bond: false,
        }
    }
}

impl DivisionParams {
    pub fn validate(&self) -> Result<(), DivisionParamsError> {
        if !(self.angle.is_finite() && (0.0..PI).contains(&self.angle)) {
            return Err(DivisionParamsError::InvalidAngle);
        }
        if !(self.ratio.is_finite() && self.ratio > 0.0) {
            return Err(DivisionParamsError::InvalidRatio);
        }
        if !self.bond_bias.is_finite() {
            return Err(DivisionParamsError::InvalidBondBias);
        }
        Ok(())
    }
}
