//! CLI command implementations.

pub mod circuit;
pub mod common;
pub mod diagnose;
pub mod factor;
pub mod gates;
pub mod imbalance;
pub mod scheduling;
pub mod vertex_cover;
