//! In-memory host world.
//!
//! A single rectangular map with walls, furniture, structures, agents and
//! item stacks. It records every request the runtime makes (slot jobs,
//! interruptions, messages) so tests and the CLI can inspect them. Ids are
//! handed out from a counter, so two identically built worlds agree.

use crate::host::{AgentHost, ItemGrid, MapGrid, StructureHost};
use std::collections::{BTreeMap, BTreeSet};
use synthesis_data::{
    AgentId, AgentSnapshot, Appearance, Cell, CellRect, Genome, ItemId, ItemStack, JobKind, MapId,
    Message, NewbornDraft, StructureId, StructureInfo,
};

#[derive(Debug, Default)]
pub struct SandboxWorld {
    pub width: i32,
    pub height: i32,
    pub tick: u64,
    walls: BTreeSet<Cell>,
    filling: BTreeSet<Cell>,
    unreachable: BTreeSet<Cell>,
    structures: BTreeMap<StructureId, StructureInfo>,
    agents: BTreeMap<AgentId, AgentSnapshot>,
    items: Vec<(Cell, ItemStack)>,
    next_id: u128,
    pub messages: Vec<Message>,
    pub slot_jobs: Vec<(AgentId, StructureId, Cell)>,
    pub interrupted: Vec<(StructureId, JobKind)>,
    pub parent_links: BTreeSet<(AgentId, AgentId)>,
    pub refreshed: Vec<AgentId>,
    pub newborns: Vec<(AgentId, NewbornDraft)>,
    /// Makes `spawn_newborn` refuse, to exercise the failure path.
    pub fail_spawns: bool,
}

impl SandboxWorld {
    pub const MAP: MapId = MapId(0);

    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            next_id: 1,
            ..Default::default()
        }
    }

    fn fresh_id(&mut self) -> u128 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_structure(&mut self, rect: CellRect, interaction: Cell, powered: bool) -> StructureId {
        let id = StructureId::from_u128(self.fresh_id());
        self.structures.insert(
            id,
            StructureInfo {
                id,
                map: Self::MAP,
                rect,
                interaction_cell: interaction,
                powered,
            },
        );
        id
    }

    pub fn set_powered(&mut self, id: StructureId, powered: bool) {
        if let Some(s) = self.structures.get_mut(&id) {
            s.powered = powered;
        }
    }

    pub fn remove_structure(&mut self, id: StructureId) {
        self.structures.remove(&id);
    }

    pub fn add_wall(&mut self, cell: Cell) {
        self.walls.insert(cell);
    }

    pub fn add_filling(&mut self, cell: Cell) {
        self.filling.insert(cell);
    }

    pub fn mark_unreachable(&mut self, cell: Cell) {
        self.unreachable.insert(cell);
    }

    pub fn add_agent(&mut self, cell: Cell, genome: Genome) -> AgentId {
        let id = AgentId::from_u128(self.fresh_id());
        self.agents.insert(
            id,
            AgentSnapshot {
                id,
                map: Some(Self::MAP),
                position: cell,
                alive: true,
                downed: false,
                awake: true,
                forced_off_duty: false,
                genome,
                appearance: Appearance::default(),
            },
        );
        id
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentSnapshot> {
        self.agents.get_mut(&id)
    }

    pub fn move_agent(&mut self, id: AgentId, cell: Cell) {
        if let Some(a) = self.agents.get_mut(&id) {
            a.position = cell;
        }
    }

    pub fn kill_agent(&mut self, id: AgentId) {
        if let Some(a) = self.agents.get_mut(&id) {
            a.alive = false;
        }
    }

    /// Removes the agent record entirely.
    pub fn despawn_agent(&mut self, id: AgentId) {
        self.agents.remove(&id);
    }

    pub fn parents_of(&self, child: AgentId) -> Vec<AgentId> {
        self.parent_links
            .iter()
            .filter(|(c, _)| *c == child)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn place_items(&mut self, cell: Cell, def: &str, count: u32) -> ItemId {
        let mut stack = ItemStack::new(def, count);
        stack.id = ItemId::from_u128(self.fresh_id());
        let id = stack.id;
        self.items.push((cell, stack));
        id
    }

    /// Carries a whole stack to `cell`.
    pub fn move_stack(&mut self, id: ItemId, cell: Cell) {
        if let Some((c, _)) = self.items.iter_mut().find(|(_, s)| s.id == id) {
            *c = cell;
        }
    }

    /// Deletes a stack, as if hauled away by someone else.
    pub fn remove_item(&mut self, id: ItemId) {
        self.items.retain(|(_, s)| s.id != id);
    }

    pub fn set_forbidden(&mut self, id: ItemId, forbidden: bool) {
        if let Some((_, s)) = self.items.iter_mut().find(|(_, s)| s.id == id) {
            s.forbidden = forbidden;
        }
    }

    /// Walks every agent with an outstanding slot job onto its latest slot.
    pub fn settle_donors(&mut self) {
        let mut latest: BTreeMap<AgentId, Cell> = BTreeMap::new();
        for (agent, _, cell) in &self.slot_jobs {
            latest.insert(*agent, *cell);
        }
        for (agent, cell) in latest {
            self.move_agent(agent, cell);
        }
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    fn in_rect_of_structure(&self, cell: Cell) -> bool {
        self.structures.values().any(|s| s.rect.contains(cell))
    }
}

impl MapGrid for SandboxWorld {
    fn in_bounds(&self, map: MapId, cell: Cell) -> bool {
        map == Self::MAP && cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    fn is_standable(&self, map: MapId, cell: Cell) -> bool {
        self.in_bounds(map, cell) && !self.walls.contains(&cell)
    }

    fn has_filling_object(&self, map: MapId, cell: Cell) -> bool {
        map == Self::MAP && (self.filling.contains(&cell) || self.in_rect_of_structure(cell))
    }
}

impl ItemGrid for SandboxWorld {
    fn stacks_at(&self, map: MapId, cell: Cell) -> Vec<ItemStack> {
        if map != Self::MAP {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|(c, _)| *c == cell)
            .map(|(_, s)| s.clone())
            .collect()
    }

    fn stacks_on_map(&self, map: MapId) -> Vec<(Cell, ItemStack)> {
        if map != Self::MAP {
            return Vec::new();
        }
        self.items.clone()
    }

    fn take_from_stack(&mut self, item: ItemId, count: u32) -> u32 {
        let Some(pos) = self.items.iter().position(|(_, s)| s.id == item) else {
            return 0;
        };
        let stack = &mut self.items[pos].1;
        let taken = count.min(stack.count);
        stack.count -= taken;
        if stack.count == 0 {
            self.items.remove(pos);
        }
        taken
    }

    fn can_reach(&self, agent: AgentId, cell: Cell) -> bool {
        self.agents
            .get(&agent)
            .is_some_and(|a| a.map == Some(Self::MAP))
            && !self.unreachable.contains(&cell)
            && !self.walls.contains(&cell)
    }
}

impl AgentHost for SandboxWorld {
    fn agent(&self, id: AgentId) -> Option<AgentSnapshot> {
        self.agents.get(&id).cloned()
    }

    fn issue_slot_job(&mut self, agent: AgentId, structure: StructureId, cell: Cell) {
        self.slot_jobs.push((agent, structure, cell));
    }

    fn interrupt_jobs(&mut self, structure: StructureId, kind: JobKind) {
        self.interrupted.push((structure, kind));
    }

    fn spawn_newborn(&mut self, draft: &NewbornDraft, map: MapId, cell: Cell) -> Option<AgentId> {
        if self.fail_spawns || !self.in_bounds(map, cell) {
            return None;
        }
        let id = AgentId::from_u128(self.fresh_id());
        self.agents.insert(
            id,
            AgentSnapshot {
                id,
                map: Some(map),
                position: cell,
                alive: true,
                downed: false,
                awake: true,
                forced_off_duty: false,
                genome: draft.genome.clone(),
                appearance: draft.appearance,
            },
        );
        for parent in &draft.parents {
            self.parent_links.insert((id, *parent));
        }
        self.newborns.push((id, draft.clone()));
        Some(id)
    }

    fn add_parent_link(&mut self, child: AgentId, parent: AgentId) {
        self.parent_links.insert((child, parent));
    }

    fn refresh_visuals(&mut self, agent: AgentId) {
        self.refreshed.push(agent);
    }
}

impl StructureHost for SandboxWorld {
    fn structure(&self, id: StructureId) -> Option<StructureInfo> {
        self.structures.get(&id).copied()
    }

    fn notify(&mut self, message: Message) {
        tracing::debug!(kind = ?message.kind, structure = %message.structure, "{}", message.text);
        self.messages.push(message);
    }

    fn current_tick(&self) -> u64 {
        self.tick
    }
}
