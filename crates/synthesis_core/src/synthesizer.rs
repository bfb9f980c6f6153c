//! Offspring synthesis.
//!
//! Planning is pure: given the resolved bundle and both donor snapshots it
//! produces the newborn draft. `synthesize` then hands the draft to the host
//! and wires up the parent links once the newborn exists.

use crate::config::InheritanceConfig;
use crate::error::{FusionError, Result};
use crate::host::AgentHost;
use crate::inheritance::{resolve_offspring_traits, sync_cosmetics, to_genome, Donor, DonorWeights};
use rand::Rng;
use synthesis_data::{AgentId, AgentSnapshot, Cell, FusionProcess, NewbornDraft, Sex, TraitBundle};

/// Everything decided about the newborn before it is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub draft: NewbornDraft,
    pub weights: DonorWeights,
    /// Donor whose cosmetics and coloration the newborn copies.
    pub chosen_parent: Donor,
}

/// A placed newborn.
#[derive(Debug, Clone, PartialEq)]
pub struct Offspring {
    pub id: AgentId,
    pub synthesis: Synthesis,
}

/// Weighted pick of the cosmetic parent: `roll <= weight_a` selects A.
pub fn choose_parent<R: Rng + ?Sized>(weights: &DonorWeights, rng: &mut R) -> Donor {
    let total = weights.a + weights.b;
    if !total.is_finite() || total <= 0.0 {
        return Donor::A;
    }
    let roll = rng.gen_range(0.0..total);
    if roll <= weights.a {
        Donor::A
    } else {
        Donor::B
    }
}

/// Builds the newborn draft from a resolved bundle.
pub fn plan_offspring<R: Rng + ?Sized>(
    bundle: &TraitBundle,
    donor_a: &AgentSnapshot,
    donor_b: &AgentSnapshot,
    config: &InheritanceConfig,
    rng: &mut R,
) -> Synthesis {
    let sex = if rng.gen_bool(0.5) {
        Sex::Male
    } else {
        Sex::Female
    };

    let weights = DonorWeights::from_bundle(bundle, config.ownership_weight_scale);
    let mut held = resolve_offspring_traits(bundle, &weights);

    let chosen_parent = choose_parent(&weights, rng);
    let parent = match chosen_parent {
        Donor::A => donor_a,
        Donor::B => donor_b,
    };
    sync_cosmetics(&mut held, &parent.genome, chosen_parent, config);

    tracing::debug!(
        weight_a = weights.a,
        weight_b = weights.b,
        ?chosen_parent,
        traits = held.len(),
        "Planned offspring"
    );

    Synthesis {
        draft: NewbornDraft {
            sex,
            biological_age_ticks: 0,
            chronological_age_ticks: 0,
            life_stage_marker: true,
            genome: to_genome(&held),
            appearance: parent.appearance,
            parents: vec![donor_a.id, donor_b.id],
        },
        weights,
        chosen_parent,
    }
}

/// Instantiates the offspring of `process` at `position`.
///
/// Fails without side effects when the bundle or a donor record is gone,
/// and with `SynthesisFailed` when the host refuses to place the newborn.
pub fn synthesize<H: AgentHost + ?Sized, R: Rng + ?Sized>(
    host: &mut H,
    process: &FusionProcess,
    config: &InheritanceConfig,
    position: Cell,
    rng: &mut R,
) -> Result<Offspring> {
    let bundle = process
        .synthesized
        .as_ref()
        .ok_or_else(|| FusionError::synthesis("no resolved trait bundle"))?;
    let (a, b) = match (process.donor_a, process.donor_b) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(FusionError::synthesis("donor references cleared")),
    };
    let donor_a = host
        .agent(a)
        .ok_or_else(|| FusionError::synthesis(format!("donor {a} no longer exists")))?;
    let donor_b = host
        .agent(b)
        .ok_or_else(|| FusionError::synthesis(format!("donor {b} no longer exists")))?;

    let synthesis = plan_offspring(bundle, &donor_a, &donor_b, config, rng);
    let id = host
        .spawn_newborn(&synthesis.draft, process.map, position)
        .ok_or_else(|| FusionError::synthesis("host could not place the newborn"))?;

    // Placement may rebuild relations; link again.
    for parent in &synthesis.draft.parents {
        host.add_parent_link(id, *parent);
    }
    host.refresh_visuals(id);

    tracing::info!(offspring = %id, donor_a = %a, donor_b = %b, "Offspring synthesized");
    Ok(Offspring { id, synthesis })
}
