//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod facet;
pub mod link;
pub mod matrix;
pub mod normalize;
pub mod taxonomy;
pub mod tier;

pub use entities::*;
pub use error::DomainError;
pub use facet::{Facet, FacetSelection, PartnerType, SolutionSelection};
pub use matrix::{ColumnKey, HeaderRows, MatrixSchema, ProfileBreakdown};
pub use taxonomy::{solution_for, Solution, PRODUCTS};
pub use tier::{classify, Tier};
