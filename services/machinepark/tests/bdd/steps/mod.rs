//! BDD step definitions for machinepark service

pub mod rollup_steps;
pub mod timestop_steps;
pub mod window_steps;
