//! Headless end-to-end run on the sandbox world.
//!
//! Two donors are paired at a single station, walk to their slots, work
//! through fusion, wait out gestation, and have the stockpile hauled into
//! the footprint for assembly. The run stops when the process reaches a
//! terminal stage or the tick limit is hit.

use serde::Serialize;
use synthesis_core::config::AppConfig;
use synthesis_core::error::FusionError;
use synthesis_core::host::{AgentHost, ItemGrid, StructureHost};
use synthesis_core::metrics::MetricsSnapshot;
use synthesis_core::runtime::FusionRuntime;
use synthesis_core::sandbox::SandboxWorld;
use synthesis_data::{AgentId, Appearance, Cell, CellRect, Genome, Stage, StructureId, TraitDef};

/// Knobs for one headless run.
#[derive(Debug, Clone)]
pub struct ScenarioOptions {
    pub seed: u64,
    /// Work each donor contributes per tick.
    pub work_per_tick: f32,
    pub max_ticks: u64,
    /// Stock the map with less polymer than assembly needs.
    pub starve_materials: bool,
}

impl Default for ScenarioOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            work_per_tick: 10.0,
            max_ticks: 100_000,
            starve_materials: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub config_fingerprint: String,
    pub seed: u64,
    pub final_stage: Stage,
    pub ticks: u64,
    pub fusion_done_at: Option<u64>,
    pub gestation_done_at: Option<u64>,
    pub offspring: Option<String>,
    pub offspring_traits: Vec<String>,
    pub missing_materials: Vec<(String, u32)>,
    pub messages: Vec<String>,
    pub metrics: MetricsSnapshot,
}

fn donor_genomes() -> (Genome, Genome) {
    let a = Genome {
        germline: vec![
            TraitDef::new("PaleSkin", 0).with_exclusion("skin").cosmetic(),
            TraitDef::new("Keen", 1),
            TraitDef::new("Robust", 2).with_exclusion("build"),
        ],
        xeno: vec![TraitDef::new("NightVision", 2)],
    };
    let b = Genome {
        germline: vec![
            TraitDef::new("DarkSkin", 0).with_exclusion("skin").cosmetic(),
            TraitDef::new("Keen", 1),
            TraitDef::new("Frail", 1).with_exclusion("build"),
            TraitDef::new("Sterile", 0).non_inheritable(),
        ],
        xeno: vec![
            TraitDef::new("Gills", 3),
            TraitDef::new("Archotech", 6).with_tag("Archite"),
        ],
    };
    (a, b)
}

struct Setup {
    world: SandboxWorld,
    station: StructureId,
    donors: (AgentId, AgentId),
}

fn build_world(options: &ScenarioOptions) -> Setup {
    let mut world = SandboxWorld::new(40, 40);
    let station = world.add_structure(
        CellRect::centered(Cell::new(20, 20), 3, 3),
        Cell::new(20, 22),
        true,
    );
    let (ga, gb) = donor_genomes();
    let a = world.add_agent(Cell::new(5, 5), ga);
    let b = world.add_agent(Cell::new(6, 5), gb);
    if let Some(snap) = world.agent_mut(b) {
        snap.appearance = Appearance {
            skin: [96, 64, 48],
            hair: [20, 20, 20],
        };
    }

    world.place_items(Cell::new(30, 30), "Biomass", 40);
    world.place_items(Cell::new(31, 30), "RawMeat", 30);
    let polymer = if options.starve_materials { 10 } else { 20 };
    world.place_items(Cell::new(32, 30), "Polymer", polymer);
    world.place_items(Cell::new(33, 30), "Catalyst", 3);

    Setup {
        world,
        station,
        donors: (a, b),
    }
}

/// Moves every stockpile stack outside the footprint onto its center.
fn haul_stockpile(world: &mut SandboxWorld, station: StructureId) {
    let Some(info) = world.structure(station) else {
        return;
    };
    let center = Cell::new(
        (info.rect.min_x + info.rect.max_x) / 2,
        (info.rect.min_y + info.rect.max_y) / 2,
    );
    let outside: Vec<_> = world
        .stacks_on_map(info.map)
        .into_iter()
        .filter(|(cell, _)| !info.rect.contains(*cell))
        .map(|(_, stack)| stack.id)
        .collect();
    for id in outside {
        world.move_stack(id, center);
    }
}

pub fn run(config: AppConfig, options: &ScenarioOptions) -> anyhow::Result<ScenarioReport> {
    config.validate()?;
    let fingerprint = config.fingerprint();
    let Setup {
        mut world,
        station,
        donors: (a, b),
    } = build_world(options);
    let mut runtime = FusionRuntime::with_seed(config, options.seed);

    runtime.begin_fusion(&mut world, station, a, b)?;

    let mut fusion_done_at = None;
    let mut gestation_done_at = None;
    let mut offspring = None;
    let mut ticks = 0;

    while ticks < options.max_ticks && !runtime.stage_of(station).is_terminal() {
        ticks += 1;
        world.advance_tick();
        world.settle_donors();

        match runtime.stage_of(station) {
            Stage::Fusion => {
                for donor in [a, b] {
                    if runtime.stage_of(station) != Stage::Fusion {
                        break;
                    }
                    runtime.notify_slot_arrival(&world, station, donor);
                    runtime.notify_fusion_work(&mut world, station, donor, options.work_per_tick)?;
                }
                if runtime.stage_of(station) == Stage::Gestation {
                    fusion_done_at = Some(ticks);
                }
            }
            Stage::Assembly => {
                if !runtime.has_reachable_materials(&world, station, a) {
                    tracing::warn!("Assembly materials unreachable, giving up");
                    break;
                }
                haul_stockpile(&mut world, station);
                match runtime.complete_assembly(&mut world, station, a) {
                    Ok(id) => offspring = Some(id),
                    Err(FusionError::MaterialsMissing) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            _ => {}
        }

        runtime.tick_station(&mut world, station);
        if gestation_done_at.is_none() && runtime.stage_of(station) == Stage::Assembly {
            gestation_done_at = Some(ticks);
        }
    }

    let offspring_traits: Vec<String> = offspring
        .and_then(|id| world.agent(id))
        .map(|snap| snap.genome.all().map(|t| t.name.clone()).collect())
        .unwrap_or_default();

    Ok(ScenarioReport {
        config_fingerprint: fingerprint,
        seed: options.seed,
        final_stage: runtime.stage_of(station),
        ticks,
        fusion_done_at,
        gestation_done_at,
        offspring: offspring.map(|id| id.to_string()),
        offspring_traits,
        missing_materials: runtime.missing_materials(&world, station),
        messages: world.messages.iter().map(|m| m.text.clone()).collect(),
        metrics: runtime.metrics().snapshot(),
    })
}
