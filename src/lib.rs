//! Partner readiness tier matrix
//!
//! Loads a partner roster and per-profile competency scores, classifies every
//! scored product into a readiness tier, aggregates distinct profile counts
//! into a solution × product × tier matrix, annotates it with deltas against a
//! frozen baseline and materializes the result as a facet cache. Views over the
//! cache are filtered by partner type, region, country, solution and product.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
