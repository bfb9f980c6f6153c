//! # Synthesis Core
//!
//! Deterministic logic for fusing two donor agents into a new individual.
//!
//! A process moves through four phases at a host structure:
//! - **Fusion**: both donors stand on their slots and contribute work
//! - **Gestation**: the powered station counts down
//! - **Assembly**: materials hauled into the footprint are consumed
//! - **Birth**: the offspring is placed with inherited, conflict-resolved traits
//!
//! The host simulation is reached only through the traits in [`host`];
//! [`sandbox::SandboxWorld`] implements them in memory.
//!
//! ## Example
//!
//! ```
//! use synthesis_core::config::AppConfig;
//! use synthesis_core::runtime::FusionRuntime;
//! use synthesis_core::sandbox::SandboxWorld;
//! use synthesis_data::{Cell, CellRect, Genome, Stage};
//!
//! let mut world = SandboxWorld::new(32, 32);
//! let station = world.add_structure(
//!     CellRect::centered(Cell::new(10, 10), 3, 3),
//!     Cell::new(10, 12),
//!     true,
//! );
//! let a = world.add_agent(Cell::new(2, 2), Genome::default());
//! let b = world.add_agent(Cell::new(3, 2), Genome::default());
//!
//! let mut runtime = FusionRuntime::with_seed(AppConfig::default(), 42);
//! let process = runtime.begin_fusion(&mut world, station, a, b).unwrap();
//! assert_eq!(process.stage, Stage::Fusion);
//! ```

/// Configuration management for fusion parameters
pub mod config;
/// Error types and rejection reasons
pub mod error;
/// Interfaces consumed from the host simulation
pub mod host;
/// Trait union, ownership weights and conflict resolution
pub mod inheritance;
/// Footprint-scoped material counting and consumption
pub mod ledger;
/// Counters and structured logging
pub mod metrics;
/// Per-structure process logic
pub mod process;
/// Process registry and stage driver
pub mod runtime;
/// In-memory host world
pub mod sandbox;
/// Donor slot placement
pub mod slots;
/// Offspring planning and placement
pub mod synthesizer;

pub use config::AppConfig;
pub use error::{FusionError, Rejection, Result};
pub use host::{AgentHost, FusionHost, ItemGrid, MapGrid, StructureHost};
pub use metrics::{init_logging, FusionMetrics, MetricsSnapshot};
pub use process::ProcessLogic;
pub use runtime::{FusionRuntime, WorkOutcome};
