//! Growth engine for bodies made of bonded cells.
//!
//! A [`body::Body`] is an arena of [`cell::Cell`]s addressed by stable
//! [`cell::CellId`] handles. Cells are linked by symmetric bonds, divide into
//! two children that inherit those bonds, and are kept in contact by a local,
//! mass-damped relaxation (the overlap resolver) after every structural change.

pub mod angle;
pub mod body;
pub mod cell;
pub mod config;
pub mod constants;
pub mod metrics;
pub mod rng;
pub mod spatial;

pub use body::{Body, ResolveReport};
pub use cell::{Bond, Cell, CellId, Shape};
pub use config::{DivisionParams, GrowthConfig, Precision, ResolverConfig};
pub use metrics::{BodySnapshot, CellSnapshot, GrowthStats, GrowthSummary};
