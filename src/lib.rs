pub mod config;
pub mod geometry;
pub mod instrument;
pub mod osc;
pub mod pose;
