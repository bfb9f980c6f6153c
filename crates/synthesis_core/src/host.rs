//! Narrow interfaces the fusion core consumes from the host simulation.
//!
//! The core never owns maps, items or agents. It queries them through these
//! traits and asks the host to act (issue jobs, spawn the newborn, show a
//! message). `sandbox::SandboxWorld` implements all of them in memory.

use synthesis_data::{
    AgentId, AgentSnapshot, Cell, ItemId, ItemStack, JobKind, MapId, Message, NewbornDraft,
    StructureId, StructureInfo,
};

/// Cell queries on a single map.
pub trait MapGrid {
    fn in_bounds(&self, map: MapId, cell: Cell) -> bool;
    /// Walkable floor an agent may stand on.
    fn is_standable(&self, map: MapId, cell: Cell) -> bool;
    /// Occupied by furniture or another building that fills the cell.
    fn has_filling_object(&self, map: MapId, cell: Cell) -> bool;
}

/// Item stacks lying on maps.
pub trait ItemGrid {
    fn stacks_at(&self, map: MapId, cell: Cell) -> Vec<ItemStack>;
    /// Every stack on the map with its cell.
    fn stacks_on_map(&self, map: MapId) -> Vec<(Cell, ItemStack)>;
    /// Destructively splits up to `count` off a stack; returns how many were
    /// removed. A stack reduced to zero disappears.
    fn take_from_stack(&mut self, item: ItemId, count: u32) -> u32;
    /// Whether `agent` can path to `cell`.
    fn can_reach(&self, agent: AgentId, cell: Cell) -> bool;
}

/// Agent lookup and the task-system requests the runtime makes.
pub trait AgentHost {
    fn agent(&self, id: AgentId) -> Option<AgentSnapshot>;
    /// Ask the task system to walk `agent` to `cell` and stay there.
    fn issue_slot_job(&mut self, agent: AgentId, structure: StructureId, cell: Cell);
    /// End every in-progress job of `kind` that targets `structure`.
    fn interrupt_jobs(&mut self, structure: StructureId, kind: JobKind);
    /// Places a new agent. `None` when the host cannot instantiate it.
    fn spawn_newborn(&mut self, draft: &NewbornDraft, map: MapId, cell: Cell) -> Option<AgentId>;
    /// One-directional child → parent relation. Must be idempotent.
    fn add_parent_link(&mut self, child: AgentId, parent: AgentId);
    fn refresh_visuals(&mut self, agent: AgentId);
}

/// Structures, notifications and time.
pub trait StructureHost {
    fn structure(&self, id: StructureId) -> Option<StructureInfo>;
    fn notify(&mut self, message: Message);
    fn current_tick(&self) -> u64;
}

/// Everything the runtime needs in one bound.
pub trait FusionHost: MapGrid + ItemGrid + AgentHost + StructureHost {}

impl<T: MapGrid + ItemGrid + AgentHost + StructureHost> FusionHost for T {}
