//! Process registry and stage driver.
//!
//! `FusionRuntime` is owned by the simulation world. It is the only place
//! stages move forward; a process on its own can only abort. Every entry
//! point runs to completion synchronously within one host step.

use crate::config::AppConfig;
use crate::error::{FusionError, Rejection, Result};
use crate::host::{AgentHost, FusionHost, ItemGrid, MapGrid, StructureHost};
use crate::inheritance::build_trait_bundle;
use crate::ledger;
use crate::metrics::FusionMetrics;
use crate::process::{ProcessLogic, StageControl};
use crate::slots::solve_slots;
use crate::synthesizer::synthesize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use synthesis_data::{
    AbortReason, AgentId, FusionProcess, JobKind, MapId, Message, MessageKind, Stage, StructureId,
};

/// Result of one work contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum WorkOutcome {
    /// Preconditions unmet; nothing changed.
    Ignored,
    Accumulated,
    /// This contribution finished the fusion stage.
    Completed,
}

fn abort_text(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::DonorLost => "Synthesis aborted: a donor is gone.",
        AbortReason::DonorUnavailable => "Synthesis aborted: a donor was called away.",
        AbortReason::MaterialsLost => "Synthesis aborted: assembly materials went missing.",
        AbortReason::SynthesisFailed => "Synthesis aborted: the offspring could not be formed.",
        AbortReason::StructureLost => "Synthesis aborted: the station is gone.",
        AbortReason::Requested => "Synthesis aborted.",
    }
}

pub struct FusionRuntime {
    config: AppConfig,
    processes: BTreeMap<StructureId, FusionProcess>,
    abort_queue: BTreeSet<StructureId>,
    rng: ChaCha8Rng,
    metrics: FusionMetrics,
}

impl FusionRuntime {
    /// Seeds from `config.seed`, or from entropy when unset.
    pub fn new(config: AppConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: AppConfig, seed: u64) -> Self {
        Self {
            config,
            processes: BTreeMap::new(),
            abort_queue: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            metrics: FusionMetrics::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn metrics(&self) -> &FusionMetrics {
        &self.metrics
    }

    pub fn try_get_process(&self, structure: StructureId) -> Option<&FusionProcess> {
        self.processes.get(&structure)
    }

    /// Every registered record, terminal ones included, in structure order.
    pub fn processes(&self) -> impl Iterator<Item = &FusionProcess> {
        self.processes.values()
    }

    /// `Idle` when nothing is registered for the structure.
    pub fn stage_of(&self, structure: StructureId) -> Stage {
        self.processes
            .get(&structure)
            .map_or(Stage::Idle, |p| p.stage)
    }

    pub fn fusion_percent(&self, structure: StructureId) -> f32 {
        self.processes
            .get(&structure)
            .map_or(0.0, |p| p.fusion_percent())
    }

    pub fn gestation_percent(&self, structure: StructureId) -> f32 {
        self.processes
            .get(&structure)
            .map_or(0.0, |p| p.gestation_percent())
    }

    /// Starts a process on `structure` with donors `a` and `b`.
    ///
    /// A rejection notifies the host and leaves every piece of state as it was.
    pub fn begin_fusion<H: FusionHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
        a: AgentId,
        b: AgentId,
    ) -> Result<&FusionProcess> {
        if !self.config.fusion.enabled {
            return Err(self.reject(host, structure, Rejection::Disabled));
        }
        let Some(info) = host.structure(structure) else {
            return Err(self.reject(host, structure, Rejection::UnknownStructure));
        };
        if !info.powered {
            return Err(self.reject(host, structure, Rejection::Unpowered));
        }
        if self.stage_of(structure).is_active() {
            return Err(self.reject(host, structure, Rejection::AlreadyBusy));
        }
        if a == b {
            return Err(self.reject(host, structure, Rejection::SameDonor));
        }
        let present = |id| host.agent(id).is_some_and(|s| s.is_present_on(info.map));
        if !present(a) || !present(b) {
            return Err(self.reject(host, structure, Rejection::DonorUnavailable));
        }
        let busy = self
            .processes
            .values()
            .filter(|p| p.is_active())
            .any(|p| p.slot_for(a).is_some() || p.slot_for(b).is_some());
        if busy {
            return Err(self.reject(host, structure, Rejection::DonorBusy));
        }
        let Some(pair) = solve_slots(
            &*host,
            info.map,
            info.rect,
            info.interaction_cell,
            self.config.fusion.slot_search_radius,
        ) else {
            return Err(self.reject(host, structure, Rejection::NoValidSlots));
        };

        let process = FusionProcess::start(
            &info,
            a,
            b,
            &self.config.fusion,
            pair.left,
            pair.right,
            host.current_tick(),
        );
        self.abort_queue.remove(&structure);
        host.issue_slot_job(a, structure, pair.left);
        host.issue_slot_job(b, structure, pair.right);
        self.metrics.record_started();
        tracing::info!(
            %structure,
            donor_a = %a,
            donor_b = %b,
            slot_a = ?pair.left,
            slot_b = ?pair.right,
            "Fusion started"
        );

        let stored = match self.processes.entry(structure) {
            Entry::Occupied(mut e) => {
                e.insert(process);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(process),
        };
        Ok(stored)
    }

    /// One station step: validates the process and advances gestation.
    pub fn tick_station<H: FusionHost + ?Sized>(&mut self, host: &mut H, structure: StructureId) {
        let Some(process) = self.processes.get_mut(&structure) else {
            return;
        };
        if !process.is_active() {
            return;
        }
        process.station_ticks += 1;

        let Some(info) = host.structure(structure) else {
            self.force_abort(host, structure, AbortReason::StructureLost);
            return;
        };

        if matches!(process.stage, Stage::Fusion | Stage::Gestation) {
            let Some((a, b)) = process.donors() else {
                self.force_abort(host, structure, AbortReason::DonorLost);
                return;
            };
            let (Some(snap_a), Some(snap_b)) = (host.agent(a), host.agent(b)) else {
                self.force_abort(host, structure, AbortReason::DonorLost);
                return;
            };
            if !snap_a.is_present_on(process.map) || !snap_b.is_present_on(process.map) {
                self.force_abort(host, structure, AbortReason::DonorLost);
                return;
            }
            if process.stage == Stage::Fusion && (snap_a.forced_off_duty || snap_b.forced_off_duty)
            {
                self.force_abort(host, structure, AbortReason::DonorUnavailable);
                return;
            }

            let interval = self.config.fusion.slot_reissue_interval.max(1);
            if process.station_ticks % interval == 0 {
                for (snap, slot) in [(&snap_a, process.slot_a), (&snap_b, process.slot_b)] {
                    if snap.position != slot {
                        tracing::debug!(%structure, donor = %snap.id, ?slot, "Re-issuing slot job");
                        host.issue_slot_job(snap.id, structure, slot);
                    }
                }
            }
        }

        if process.stage == Stage::Gestation && info.powered {
            process.gestation_ticks += 1;
            if process.gestation_ticks >= process.gestation_required {
                if let Err(e) = process.advance_to(Stage::Assembly) {
                    tracing::error!(%structure, "Gestation could not finish: {}", e);
                    return;
                }
                tracing::info!(%structure, "Gestation complete, awaiting assembly");
            }
        }
    }

    /// Ticks every active process.
    pub fn tick_all<H: FusionHost + ?Sized>(&mut self, host: &mut H) {
        let active: Vec<StructureId> = self
            .processes
            .iter()
            .filter(|(_, p)| p.is_active())
            .map(|(id, _)| *id)
            .collect();
        for structure in active {
            self.tick_station(host, structure);
        }
    }

    /// Adds `delta` work from `worker` to the fusion stage.
    ///
    /// Contributions only count while powered and with both donors on their
    /// slots. The contribution that reaches the requirement resolves the
    /// trait bundle and starts gestation.
    pub fn notify_fusion_work<H: FusionHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
        worker: AgentId,
        delta: f32,
    ) -> Result<WorkOutcome> {
        let Self {
            config,
            processes,
            rng,
            ..
        } = self;
        let process = processes
            .get_mut(&structure)
            .ok_or(FusionError::NoProcess(structure))?;
        if process.stage != Stage::Fusion {
            return Err(FusionError::WrongStage {
                expected: Stage::Fusion,
                actual: process.stage,
            });
        }
        if !delta.is_finite() || delta < 0.0 || process.slot_for(worker).is_none() {
            return Ok(WorkOutcome::Ignored);
        }
        if !host.structure(structure).is_some_and(|s| s.powered) {
            return Ok(WorkOutcome::Ignored);
        }
        if !process.donors_in_position(&*host) {
            return Ok(WorkOutcome::Ignored);
        }
        let Some((a, b)) = process.donors() else {
            return Ok(WorkOutcome::Ignored);
        };
        let (Some(snap_a), Some(snap_b)) = (host.agent(a), host.agent(b)) else {
            return Ok(WorkOutcome::Ignored);
        };
        if config.fusion.require_eligible_state && !(snap_a.is_eligible() && snap_b.is_eligible()) {
            return Ok(WorkOutcome::Ignored);
        }

        process.fusion_progress += delta;
        if process.fusion_progress < process.fusion_required {
            return Ok(WorkOutcome::Accumulated);
        }

        let bundle = build_trait_bundle(&snap_a.genome, &snap_b.genome, &config.inheritance, rng);
        tracing::info!(%structure, traits = bundle.len(), "Fusion complete, gestation begins");
        process.synthesized = Some(bundle);
        process.advance_to(Stage::Gestation)?;
        Ok(WorkOutcome::Completed)
    }

    /// Slot-arrival callback. Returns whether both donors are now in place.
    pub fn notify_slot_arrival<H: AgentHost + ?Sized>(
        &self,
        host: &H,
        structure: StructureId,
        agent: AgentId,
    ) -> bool {
        let Some(process) = self.processes.get(&structure) else {
            return false;
        };
        if !process.is_active() || process.slot_for(agent).is_none() {
            return false;
        }
        let ready = process.donors_in_position(host);
        if ready {
            tracing::debug!(%structure, "Both donors in position");
        }
        ready
    }

    /// Assembly-task completion: consumes the footprint materials, then
    /// spawns the newborn.
    ///
    /// Too little material is a plain error and leaves the process waiting.
    /// A shortfall discovered during consumption aborts it.
    pub fn complete_assembly<H: FusionHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
        worker: AgentId,
    ) -> Result<AgentId> {
        let process = self
            .processes
            .get(&structure)
            .ok_or(FusionError::NoProcess(structure))?;
        if process.stage != Stage::Assembly {
            return Err(FusionError::WrongStage {
                expected: Stage::Assembly,
                actual: process.stage,
            });
        }
        let Some(info) = host.structure(structure) else {
            self.force_abort(host, structure, AbortReason::StructureLost);
            return Err(FusionError::synthesis("station missing"));
        };

        let requirements = &self.config.assembly.materials;
        if !ledger::has_all_assembly_materials_in_footprint(&*host, info.map, info.rect, requirements)
        {
            return Err(FusionError::MaterialsMissing);
        }
        if !ledger::try_consume_assembly_materials(host, info.map, info.rect, requirements) {
            self.force_abort(host, structure, AbortReason::MaterialsLost);
            return Err(FusionError::MaterialsMissing);
        }
        tracing::debug!(%structure, %worker, "Assembly materials consumed");
        self.spawn_newborn_from_assembly(host, structure)
    }

    /// Instantiates the offspring at the interaction cell.
    ///
    /// Success completes the process. Any failure aborts it; consumed
    /// materials are not refunded.
    pub fn spawn_newborn_from_assembly<H: FusionHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
    ) -> Result<AgentId> {
        let Self {
            config,
            processes,
            rng,
            abort_queue,
            metrics,
        } = self;
        let process = processes
            .get_mut(&structure)
            .ok_or(FusionError::NoProcess(structure))?;
        if process.stage != Stage::Assembly {
            return Err(FusionError::WrongStage {
                expected: Stage::Assembly,
                actual: process.stage,
            });
        }

        let outcome = match host.structure(structure) {
            Some(info) => synthesize(host, process, &config.inheritance, info.interaction_cell, rng),
            None => Err(FusionError::synthesis("station missing")),
        };
        match outcome {
            Ok(offspring) => {
                process.advance_to(Stage::Complete)?;
                process.synthesized = None;
                process.offspring = Some(offspring.id);
                process.donor_a = None;
                process.donor_b = None;
                abort_queue.remove(&structure);
                metrics.record_completed();
                host.notify(Message::new(
                    MessageKind::Completed,
                    structure,
                    "A new individual has been synthesized.",
                ));
                Ok(offspring.id)
            }
            Err(e) => {
                tracing::warn!(%structure, "Synthesis failed: {}", e);
                self.force_abort(host, structure, AbortReason::SynthesisFailed);
                Err(e)
            }
        }
    }

    /// Direct abort. Returns `false` when nothing active was there to abort.
    pub fn abort<H: StructureHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
        reason: AbortReason,
    ) -> bool {
        self.force_abort(host, structure, reason)
    }

    /// Flags the structure for an abort-by-visit and interrupts assembly
    /// work on it, so the abort job can claim the station.
    pub fn queue_abort_open_job<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
    ) -> bool {
        if !matches!(self.stage_of(structure), Stage::Gestation | Stage::Assembly) {
            return false;
        }
        if self.abort_queue.insert(structure) {
            host.interrupt_jobs(structure, JobKind::Assembly);
            tracing::info!(%structure, "Abort queued");
        }
        true
    }

    pub fn is_abort_queued(&self, structure: StructureId) -> bool {
        self.abort_queue.contains(&structure)
            && matches!(self.stage_of(structure), Stage::Gestation | Stage::Assembly)
    }

    pub fn clear_abort_queued(&mut self, structure: StructureId) {
        self.abort_queue.remove(&structure);
    }

    /// Structures on `map` waiting for an abort job.
    pub fn abort_queued_on_map(&self, map: MapId) -> Vec<StructureId> {
        self.abort_queue
            .iter()
            .copied()
            .filter(|s| {
                self.processes.get(s).is_some_and(|p| {
                    p.map == map && matches!(p.stage, Stage::Gestation | Stage::Assembly)
                })
            })
            .collect()
    }

    /// The queued abort job finished its visit.
    pub fn complete_abort_job<H: StructureHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
    ) -> bool {
        if !self.is_abort_queued(structure) {
            self.abort_queue.remove(&structure);
            return false;
        }
        self.force_abort(host, structure, AbortReason::Requested)
    }

    /// Stack count of `defs` inside the structure's footprint.
    pub fn footprint_count<H: FusionHost + ?Sized>(
        &self,
        host: &H,
        structure: StructureId,
        defs: &[String],
    ) -> u32 {
        host.structure(structure).map_or(0, |info| {
            ledger::count_in_footprint_flexible(host, info.map, info.rect, defs)
        })
    }

    pub fn missing_materials<H: MapGrid + ItemGrid + StructureHost + ?Sized>(
        &self,
        host: &H,
        structure: StructureId,
    ) -> Vec<(String, u32)> {
        match host.structure(structure) {
            Some(info) => ledger::missing_assembly_materials(
                host,
                info.map,
                info.rect,
                &self.config.assembly.materials,
            ),
            None => Vec::new(),
        }
    }

    /// Whether `agent` could gather everything assembly needs.
    pub fn has_reachable_materials<H: MapGrid + ItemGrid + StructureHost + ?Sized>(
        &self,
        host: &H,
        structure: StructureId,
        agent: AgentId,
    ) -> bool {
        host.structure(structure).is_some_and(|info| {
            ledger::has_all_reachable_assembly_materials(
                host,
                info.map,
                info.rect,
                &self.config.assembly.materials,
                agent,
            )
        })
    }

    fn reject<H: StructureHost + ?Sized>(
        &self,
        host: &mut H,
        structure: StructureId,
        rejection: Rejection,
    ) -> FusionError {
        self.metrics.record_rejected();
        tracing::info!(%structure, ?rejection, "Fusion rejected");
        host.notify(Message::new(
            MessageKind::Rejected,
            structure,
            rejection.message(),
        ));
        FusionError::Rejected(rejection)
    }

    fn force_abort<H: StructureHost + ?Sized>(
        &mut self,
        host: &mut H,
        structure: StructureId,
        reason: AbortReason,
    ) -> bool {
        self.abort_queue.remove(&structure);
        let Some(process) = self.processes.get_mut(&structure) else {
            return false;
        };
        if !process.is_active() {
            return false;
        }
        let from = process.stage;
        process.abort(reason);
        self.metrics.record_aborted();
        tracing::warn!(%structure, ?from, ?reason, "Fusion aborted");
        host.notify(Message::new(
            MessageKind::Aborted,
            structure,
            abort_text(reason),
        ));
        true
    }
}
