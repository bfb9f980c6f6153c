pub use synthesis_data::{AbortReason, FusionProcess, Stage};

use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::host::AgentHost;
use synthesis_data::{AgentId, Cell, StructureInfo};

pub trait ProcessLogic {
    fn start(
        info: &StructureInfo,
        donor_a: AgentId,
        donor_b: AgentId,
        config: &FusionConfig,
        slot_a: Cell,
        slot_b: Cell,
        now: u64,
    ) -> Self;
    fn fusion_percent(&self) -> f32;
    fn gestation_percent(&self) -> f32;
    fn donors(&self) -> Option<(AgentId, AgentId)>;
    fn slot_for(&self, agent: AgentId) -> Option<Cell>;
    fn donors_in_position<H: AgentHost + ?Sized>(&self, host: &H) -> bool;
    fn abort(&mut self, reason: AbortReason);
    fn is_active(&self) -> bool;
}

#[inline]
fn ratio(progress: f64, required: f64) -> f32 {
    if required <= 0.0 {
        return 1.0;
    }
    let r = progress / required;
    if r.is_nan() {
        0.0
    } else {
        r.clamp(0.0, 1.0) as f32
    }
}

impl ProcessLogic for FusionProcess {
    fn start(
        info: &StructureInfo,
        donor_a: AgentId,
        donor_b: AgentId,
        config: &FusionConfig,
        slot_a: Cell,
        slot_b: Cell,
        now: u64,
    ) -> Self {
        Self {
            structure: info.id,
            map: info.map,
            stage: Stage::Fusion,
            donor_a: Some(donor_a),
            donor_b: Some(donor_b),
            slot_a,
            slot_b,
            fusion_progress: 0.0,
            fusion_required: config.work_required,
            gestation_ticks: 0,
            gestation_required: config.gestation_ticks,
            synthesized: None,
            started_at: now,
            station_ticks: 0,
            abort_reason: None,
            offspring: None,
        }
    }

    fn fusion_percent(&self) -> f32 {
        ratio(f64::from(self.fusion_progress), f64::from(self.fusion_required))
    }

    fn gestation_percent(&self) -> f32 {
        ratio(self.gestation_ticks as f64, self.gestation_required as f64)
    }

    fn donors(&self) -> Option<(AgentId, AgentId)> {
        self.donor_a.zip(self.donor_b)
    }

    fn slot_for(&self, agent: AgentId) -> Option<Cell> {
        if self.donor_a == Some(agent) {
            Some(self.slot_a)
        } else if self.donor_b == Some(agent) {
            Some(self.slot_b)
        } else {
            None
        }
    }

    /// Both donors spawned on the structure's map, each exactly on its slot.
    fn donors_in_position<H: AgentHost + ?Sized>(&self, host: &H) -> bool {
        let Some((a, b)) = self.donors() else {
            return false;
        };
        [(a, self.slot_a), (b, self.slot_b)].iter().all(|&(id, slot)| {
            host.agent(id)
                .is_some_and(|s| s.is_present_on(self.map) && s.position == slot)
        })
    }

    /// Moves to `Aborted` from any stage.
    fn abort(&mut self, reason: AbortReason) {
        self.stage = Stage::Aborted;
        self.abort_reason = Some(reason);
        self.donor_a = None;
        self.donor_b = None;
    }

    fn is_active(&self) -> bool {
        self.stage.is_active()
    }
}

/// Forward transitions, reserved for the runtime.
pub(crate) trait StageControl {
    fn advance_to(&mut self, next: Stage) -> Result<()>;
}

impl StageControl for FusionProcess {
    fn advance_to(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_advance_to(next) || next == Stage::Aborted {
            return Err(FusionError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        tracing::debug!(structure = %self.structure, from = ?self.stage, to = ?next, "Stage transition");
        self.stage = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::SandboxWorld;
    use synthesis_data::{CellRect, Genome, MapId, StructureId};

    fn info() -> StructureInfo {
        StructureInfo {
            id: StructureId::from_u128(7),
            map: SandboxWorld::MAP,
            rect: CellRect::centered(Cell::new(10, 10), 3, 3),
            interaction_cell: Cell::new(10, 12),
            powered: true,
        }
    }

    fn started(a: AgentId, b: AgentId) -> FusionProcess {
        FusionProcess::start(
            &info(),
            a,
            b,
            &FusionConfig::default(),
            Cell::new(8, 12),
            Cell::new(12, 12),
            42,
        )
    }

    #[test]
    fn test_start_initializes_counters() {
        let p = started(AgentId::from_u128(1), AgentId::from_u128(2));
        assert_eq!(p.stage, Stage::Fusion);
        assert_eq!(p.fusion_progress, 0.0);
        assert_eq!(p.fusion_required, 1200.0);
        assert_eq!(p.gestation_required, 60_000);
        assert_eq!(p.started_at, 42);
        assert!(p.synthesized.is_none());
        assert!(p.is_active());
    }

    #[test]
    fn test_percent_clamped() {
        let mut p = started(AgentId::from_u128(1), AgentId::from_u128(2));
        p.fusion_progress = 600.0;
        assert!((p.fusion_percent() - 0.5).abs() < 1e-6);
        p.fusion_progress = 5000.0;
        assert_eq!(p.fusion_percent(), 1.0);
        p.fusion_progress = -3.0;
        assert_eq!(p.fusion_percent(), 0.0);
        p.fusion_required = 0.0;
        assert_eq!(p.fusion_percent(), 1.0);
        p.gestation_ticks = 90_000;
        assert_eq!(p.gestation_percent(), 1.0);
    }

    #[test]
    fn test_slot_for_donor() {
        let (a, b) = (AgentId::from_u128(1), AgentId::from_u128(2));
        let p = started(a, b);
        assert_eq!(p.slot_for(a), Some(Cell::new(8, 12)));
        assert_eq!(p.slot_for(b), Some(Cell::new(12, 12)));
        assert_eq!(p.slot_for(AgentId::from_u128(3)), None);
    }

    #[test]
    fn test_donors_in_position() {
        let mut world = SandboxWorld::new(30, 30);
        let a = world.add_agent(Cell::new(1, 1), Genome::default());
        let b = world.add_agent(Cell::new(2, 1), Genome::default());
        let p = started(a, b);
        assert!(!p.donors_in_position(&world));

        world.move_agent(a, Cell::new(8, 12));
        assert!(!p.donors_in_position(&world));
        world.move_agent(b, Cell::new(12, 12));
        assert!(p.donors_in_position(&world));

        world.agent_mut(b).unwrap().map = Some(MapId(9));
        assert!(!p.donors_in_position(&world));
    }

    #[test]
    fn test_abort_unconditional() {
        let mut p = started(AgentId::from_u128(1), AgentId::from_u128(2));
        p.stage = Stage::Complete;
        p.abort(AbortReason::Requested);
        assert_eq!(p.stage, Stage::Aborted);
        assert_eq!(p.abort_reason, Some(AbortReason::Requested));
        assert!(p.donors().is_none());
    }

    #[test]
    fn test_advance_rejects_skips() {
        let mut p = started(AgentId::from_u128(1), AgentId::from_u128(2));
        assert!(p.advance_to(Stage::Assembly).is_err());
        assert!(p.advance_to(Stage::Aborted).is_err());
        p.advance_to(Stage::Gestation).unwrap();
        assert_eq!(
            p.advance_to(Stage::Gestation),
            Err(FusionError::InvalidTransition {
                from: Stage::Gestation,
                to: Stage::Gestation
            })
        );
        p.advance_to(Stage::Assembly).unwrap();
        p.advance_to(Stage::Complete).unwrap();
        assert!(!p.is_active());
    }
}
