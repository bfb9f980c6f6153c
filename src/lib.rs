//! Synthesis: multi-stage fusion of two donors into a new individual.
//!
//! The simulation logic lives in the `synthesis_core` and `synthesis_data`
//! workspace crates; this library re-exports them under [`model`] and adds
//! the headless [`scenario`] runner used by the CLI.

pub mod model;
pub mod scenario;
