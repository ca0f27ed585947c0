pub mod geometry;
pub mod label;
pub mod model;
