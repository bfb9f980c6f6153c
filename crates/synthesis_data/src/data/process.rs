use super::genome::{TraitDef, TraitLayer};
use super::geometry::{Cell, CellRect};
use super::ids::{AgentId, MapId, StructureId};
use serde::{Deserialize, Serialize};

/// Phase of a fusion process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Idle,
    Fusion,
    Gestation,
    Assembly,
    Complete,
    Aborted,
}

impl Stage {
    /// Fusion, Gestation and Assembly occupy the structure.
    pub fn is_active(self) -> bool {
        matches!(self, Stage::Fusion | Stage::Gestation | Stage::Assembly)
    }

    /// Complete or Aborted: the record stays until the next start.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Aborted)
    }

    /// The single forward successor of an active stage (or of Idle).
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::Fusion),
            Stage::Fusion => Some(Stage::Gestation),
            Stage::Gestation => Some(Stage::Assembly),
            Stage::Assembly => Some(Stage::Complete),
            Stage::Complete | Stage::Aborted => None,
        }
    }

    /// Transition table: one step forward, or any active stage to Aborted.
    pub fn can_advance_to(self, to: Stage) -> bool {
        if to == Stage::Aborted {
            return self.is_active();
        }
        self.next() == Some(to)
    }
}

/// Why a process was aborted. Advisory only; nothing branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbortReason {
    /// A donor died, vanished or left the map.
    DonorLost,
    /// A donor was forced off duty during fusion.
    DonorUnavailable,
    /// Assembly materials disappeared between the check and the consumption.
    MaterialsLost,
    /// The offspring could not be instantiated.
    SynthesisFailed,
    /// The host structure disappeared.
    StructureLost,
    /// Someone completed an abort job or the player cancelled directly.
    Requested,
}

/// Host structure as seen by the fusion core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub id: StructureId,
    pub map: MapId,
    pub rect: CellRect,
    pub interaction_cell: Cell,
    pub powered: bool,
}

/// A trait in the resolved bundle, with the donors it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntry {
    pub def: TraitDef,
    pub from_a: bool,
    pub from_b: bool,
}

impl BundleEntry {
    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn is_shared(&self) -> bool {
        self.from_a && self.from_b
    }

    /// Same provenance: both from one donor, or both shared.
    pub fn same_source(&self, other: &BundleEntry) -> bool {
        self.from_a == other.from_a && self.from_b == other.from_b
    }
}

/// Deduplicated, exclusion-filtered union of both donors' traits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitBundle {
    pub germline: Vec<BundleEntry>,
    pub xeno: Vec<BundleEntry>,
}

impl TraitBundle {
    pub fn layer(&self, layer: TraitLayer) -> &[BundleEntry] {
        match layer {
            TraitLayer::Germline => &self.germline,
            TraitLayer::Xeno => &self.xeno,
        }
    }

    pub fn layer_mut(&mut self, layer: TraitLayer) -> &mut Vec<BundleEntry> {
        match layer {
            TraitLayer::Germline => &mut self.germline,
            TraitLayer::Xeno => &mut self.xeno,
        }
    }

    /// Germline entries first, then xeno, each in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (TraitLayer, &BundleEntry)> {
        self.germline
            .iter()
            .map(|e| (TraitLayer::Germline, e))
            .chain(self.xeno.iter().map(|e| (TraitLayer::Xeno, e)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().any(|(_, e)| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.germline.len() + self.xeno.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-structure fusion state. Plain fields so a host save system can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionProcess {
    pub structure: StructureId,
    pub map: MapId,
    pub stage: Stage,
    pub donor_a: Option<AgentId>,
    pub donor_b: Option<AgentId>,
    pub slot_a: Cell,
    pub slot_b: Cell,
    pub fusion_progress: f32,
    pub fusion_required: f32,
    pub gestation_ticks: u64,
    pub gestation_required: u64,
    pub synthesized: Option<TraitBundle>,
    /// Host tick at which the process started.
    pub started_at: u64,
    /// Number of station ticks seen since start.
    pub station_ticks: u64,
    pub abort_reason: Option<AbortReason>,
    pub offspring: Option<AgentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_forward_chain() {
        let mut stage = Stage::Idle;
        let mut path = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_advance_to(next));
            stage = next;
            path.push(stage);
        }
        assert_eq!(
            path,
            vec![
                Stage::Idle,
                Stage::Fusion,
                Stage::Gestation,
                Stage::Assembly,
                Stage::Complete
            ]
        );
    }

    #[test]
    fn test_abort_only_from_active() {
        assert!(Stage::Fusion.can_advance_to(Stage::Aborted));
        assert!(Stage::Gestation.can_advance_to(Stage::Aborted));
        assert!(Stage::Assembly.can_advance_to(Stage::Aborted));
        assert!(!Stage::Idle.can_advance_to(Stage::Aborted));
        assert!(!Stage::Complete.can_advance_to(Stage::Aborted));
        assert!(!Stage::Aborted.can_advance_to(Stage::Aborted));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(Stage::Complete.is_terminal());
        assert!(Stage::Aborted.is_terminal());
        assert!(!Stage::Idle.is_terminal());
        assert!(!Stage::Assembly.is_terminal());
    }

    #[test]
    fn test_same_source() {
        let entry = |from_a, from_b| BundleEntry {
            def: TraitDef::new("Keen", 1),
            from_a,
            from_b,
        };
        assert!(entry(true, false).same_source(&entry(true, false)));
        assert!(!entry(true, false).same_source(&entry(true, true)));
        assert!(!entry(false, true).same_source(&entry(true, false)));
    }

    #[test]
    fn test_no_backward_or_skipping() {
        assert!(!Stage::Gestation.can_advance_to(Stage::Fusion));
        assert!(!Stage::Fusion.can_advance_to(Stage::Assembly));
        assert!(!Stage::Complete.can_advance_to(Stage::Fusion));
    }
}
