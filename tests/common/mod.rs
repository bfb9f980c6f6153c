pub mod macros;

use synthesis_lib::model::config::AppConfig;
use synthesis_lib::model::runtime::FusionRuntime;
use synthesis_lib::model::sandbox::SandboxWorld;
use synthesis_lib::model::state::{AgentId, Cell, CellRect, Genome, Stage, StructureId, TraitDef};

type WorldMod = Box<dyn FnOnce(&mut SandboxWorld)>;

#[allow(dead_code)]
pub struct StationBuilder {
    config: AppConfig,
    seed: u64,
    rect: CellRect,
    interaction: Cell,
    powered: bool,
    donors: Vec<(Cell, Genome)>,
    world_mods: Vec<WorldMod>,
}

#[allow(dead_code)]
impl StationBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.fusion.work_required = 100.0;
        config.fusion.gestation_ticks = 20;
        Self {
            config,
            seed: 7,
            rect: CellRect::centered(Cell::new(10, 10), 3, 3),
            interaction: Cell::new(10, 12),
            powered: true,
            donors: Vec::new(),
            world_mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn unpowered(mut self) -> Self {
        self.powered = false;
        self
    }

    pub fn with_donor(mut self, cell: Cell, genome: Genome) -> Self {
        self.donors.push((cell, genome));
        self
    }

    pub fn with_items(mut self, cell: Cell, def: &'static str, count: u32) -> Self {
        self.world_mods.push(Box::new(move |world| {
            world.place_items(cell, def, count);
        }));
        self
    }

    pub fn with_wall(mut self, cell: Cell) -> Self {
        self.world_mods.push(Box::new(move |world| world.add_wall(cell)));
        self
    }

    pub fn build(self) -> Harness {
        let mut world = SandboxWorld::new(32, 32);
        let station = world.add_structure(self.rect, self.interaction, self.powered);
        let mut donors = Vec::new();
        for (cell, genome) in self.donors {
            donors.push(world.add_agent(cell, genome));
        }
        while donors.len() < 2 {
            let x = 2 + donors.len() as i32;
            donors.push(world.add_agent(Cell::new(x, 2), Genome::default()));
        }
        for modifier in self.world_mods {
            modifier(&mut world);
        }
        Harness {
            runtime: FusionRuntime::with_seed(self.config, self.seed),
            world,
            station,
            a: donors[0],
            b: donors[1],
        }
    }
}

pub struct Harness {
    pub world: SandboxWorld,
    pub runtime: FusionRuntime,
    pub station: StructureId,
    pub a: AgentId,
    pub b: AgentId,
}

#[allow(dead_code)]
impl Harness {
    pub fn begin(&mut self) {
        self.runtime
            .begin_fusion(&mut self.world, self.station, self.a, self.b)
            .expect("fusion should start");
    }

    pub fn stage(&self) -> Stage {
        self.runtime.stage_of(self.station)
    }

    /// Walks donors onto their slots and feeds work until fusion ends.
    pub fn finish_fusion(&mut self) {
        self.world.settle_donors();
        let mut guard = 0;
        while self.stage() == Stage::Fusion {
            for donor in [self.a, self.b] {
                if self.stage() != Stage::Fusion {
                    break;
                }
                self.runtime
                    .notify_fusion_work(&mut self.world, self.station, donor, 10.0)
                    .expect("work accepted");
            }
            guard += 1;
            assert!(guard < 10_000, "fusion never completed");
        }
    }

    pub fn tick(&mut self, n: u64) {
        for _ in 0..n {
            self.world.advance_tick();
            self.runtime.tick_station(&mut self.world, self.station);
        }
    }

    /// Puts exactly the default assembly requirements inside the footprint.
    pub fn stock_footprint(&mut self) {
        self.world.place_items(Cell::new(9, 9), "Biomass", 62);
        self.world.place_items(Cell::new(10, 10), "Polymer", 15);
        self.world.place_items(Cell::new(11, 11), "Catalyst", 3);
    }

    pub fn to_assembly(&mut self) {
        self.begin();
        self.finish_fusion();
        let needed = self.runtime.config().fusion.gestation_ticks;
        self.tick(needed);
        assert_eq!(self.stage(), Stage::Assembly);
    }
}

#[allow(dead_code)]
pub fn genome(germline: &[TraitDef], xeno: &[TraitDef]) -> Genome {
    Genome {
        germline: germline.to_vec(),
        xeno: xeno.to_vec(),
    }
}
