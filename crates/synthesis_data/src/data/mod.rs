//! Core data structures for the synthesis simulation.

pub mod agent;
pub mod genome;
pub mod geometry;
pub mod ids;
pub mod item;
pub mod process;

pub use agent::{AgentSnapshot, JobKind, Message, MessageKind, NewbornDraft, Sex};
pub use genome::{Appearance, Genome, TraitDef, TraitLayer};
pub use geometry::{Cell, CellRect, Side};
pub use ids::{AgentId, ItemId, MapId, StructureId};
pub use item::ItemStack;
pub use process::{
    AbortReason, BundleEntry, FusionProcess, Stage, StructureInfo, TraitBundle,
};
