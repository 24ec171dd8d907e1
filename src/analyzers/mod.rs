//! Score sheet classification, scoring and ranking.
//!
//! This module picks the identity and subject columns of a merged dataset,
//! computes per-row totals, percentages, dense ranks and pass/fail results,
//! and assembles the charts and tables shown to the user.

pub mod aggregate;
pub mod analyzer;
pub mod classify;
pub mod outcome;
pub mod types;
pub mod utility;
