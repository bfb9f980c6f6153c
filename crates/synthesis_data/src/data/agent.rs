use super::genome::{Appearance, Genome};
use super::geometry::Cell;
use super::ids::{AgentId, MapId, StructureId};
use serde::{Deserialize, Serialize};

/// Biological sex. There is no "unspecified" variant; naming
/// and relation code downstream expects one of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Read-only view of an agent as reported by the host each time it is asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    /// `None` when the agent is not spawned on any map.
    pub map: Option<MapId>,
    pub position: Cell,
    pub alive: bool,
    pub downed: bool,
    pub awake: bool,
    /// Drafted or otherwise pulled off normal duty by the player.
    pub forced_off_duty: bool,
    pub genome: Genome,
    pub appearance: Appearance,
}

impl AgentSnapshot {
    /// Alive and spawned on `map`.
    pub fn is_present_on(&self, map: MapId) -> bool {
        self.alive && self.map == Some(map)
    }

    /// Able to take part in fusion work right now.
    pub fn is_eligible(&self) -> bool {
        self.alive && self.awake && !self.downed
    }
}

/// The agent shell handed to the host for placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewbornDraft {
    pub sex: Sex,
    pub biological_age_ticks: u64,
    pub chronological_age_ticks: u64,
    /// Newborn life-stage marker, set before placement.
    pub life_stage_marker: bool,
    pub genome: Genome,
    pub appearance: Appearance,
    /// One-directional parent links (child → parent).
    pub parents: Vec<AgentId>,
}

/// Kinds of host tasks the runtime issues or interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    Assembly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Rejected,
    Aborted,
    Completed,
}

/// User-visible notification raised through the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub structure: StructureId,
    pub text: String,
}

impl Message {
    pub fn new(kind: MessageKind, structure: StructureId, text: impl Into<String>) -> Self {
        Self {
            kind,
            structure,
            text: text.into(),
        }
    }
}
