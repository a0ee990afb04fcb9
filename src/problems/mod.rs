//! Graph problems formulated as binary quadratic models.

pub mod graphs;
pub mod imbalance;
pub mod vertex_cover;

pub use graphs::{circular_ladder_graph, star_graph, wheel_graph, Graph};
pub use imbalance::{solve_structural_imbalance, ImbalanceReport, SignedGraph};
pub use vertex_cover::{is_vertex_cover, min_vertex_cover, vertex_cover_model};
