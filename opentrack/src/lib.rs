pub mod graph;
pub mod tracker;
