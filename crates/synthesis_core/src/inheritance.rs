//! Trait union, ownership weights and conflict resolution.
//!
//! The bundle is built once when fusion completes. Conflict resolution runs
//! at birth: when two traits share an exclusion tag, the one whose source
//! donor carries the higher ownership weight is kept.

use crate::config::InheritanceConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use synthesis_data::{BundleEntry, Genome, TraitBundle, TraitDef, TraitLayer};

/// One of the two donors of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Donor {
    A,
    B,
}

/// Ownership weights of both donors.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DonorWeights {
    pub a: f64,
    pub b: f64,
}

impl DonorWeights {
    /// Weights derived from the complexity each donor contributed to `bundle`.
    pub fn from_bundle(bundle: &TraitBundle, scale: f64) -> Self {
        Self {
            a: ownership_weight(donor_complexity(bundle, Donor::A), scale),
            b: ownership_weight(donor_complexity(bundle, Donor::B), scale),
        }
    }

    /// Weight of an entry's source. Shared traits score the mean.
    pub fn of_entry(&self, entry: &BundleEntry) -> f64 {
        match (entry.from_a, entry.from_b) {
            (true, true) => (self.a + self.b) / 2.0,
            (true, false) => self.a,
            (false, true) => self.b,
            (false, false) => 0.0,
        }
    }
}

/// `scale / (1 + complexity)`: simpler donors weigh more.
#[inline]
pub fn ownership_weight(complexity: i64, scale: f64) -> f64 {
    scale / (1.0 + complexity.max(0) as f64)
}

/// Summed non-negative complexity of the traits `donor` put into the bundle.
pub fn donor_complexity(bundle: &TraitBundle, donor: Donor) -> i64 {
    bundle
        .entries()
        .filter(|(_, e)| match donor {
            Donor::A => e.from_a,
            Donor::B => e.from_b,
        })
        .map(|(_, e)| i64::from(e.def.complexity.max(0)))
        .sum()
}

/// Non-inheritable by flag, by name or by tag.
pub fn is_excluded(def: &TraitDef, config: &InheritanceConfig) -> bool {
    !def.inheritable
        || config.excluded_trait_names.iter().any(|n| *n == def.name)
        || def
            .tags
            .iter()
            .any(|t| config.excluded_trait_tags.contains(t))
}

fn layer_enabled(layer: TraitLayer, config: &InheritanceConfig) -> bool {
    match layer {
        TraitLayer::Germline => config.inherit_germline,
        TraitLayer::Xeno => config.inherit_xeno,
    }
}

fn merge_entry(bundle: &mut TraitBundle, layer: TraitLayer, def: &TraitDef, from: Donor) {
    for existing_layer in [TraitLayer::Germline, TraitLayer::Xeno] {
        if let Some(existing) = bundle
            .layer_mut(existing_layer)
            .iter_mut()
            .find(|e| e.def.name == def.name)
        {
            match from {
                Donor::A => existing.from_a = true,
                Donor::B => existing.from_b = true,
            }
            return;
        }
    }
    bundle.layer_mut(layer).push(BundleEntry {
        def: def.clone(),
        from_a: from == Donor::A,
        from_b: from == Donor::B,
    });
}

/// Union of both donors' inheritable traits, deduplicated by name.
///
/// A trait both donors carry appears once with both provenance flags set.
/// Germline is processed first, so a trait one donor carries as germline and
/// the other as xeno lands in germline.
pub fn build_trait_bundle<R: Rng + ?Sized>(
    donor_a: &Genome,
    donor_b: &Genome,
    config: &InheritanceConfig,
    rng: &mut R,
) -> TraitBundle {
    let mut bundle = TraitBundle::default();
    for layer in [TraitLayer::Germline, TraitLayer::Xeno] {
        if !layer_enabled(layer, config) {
            continue;
        }
        let sources = donor_a
            .layer(layer)
            .iter()
            .map(|d| (d, Donor::A))
            .chain(donor_b.layer(layer).iter().map(|d| (d, Donor::B)));
        for (def, from) in sources {
            if is_excluded(def, config) {
                tracing::trace!(trait_name = %def.name, "Trait excluded from inheritance");
                continue;
            }
            merge_entry(&mut bundle, layer, def, from);
        }
    }

    if config.trim_to_caps {
        trim_to_caps(&mut bundle, config, rng);
    }
    bundle
}

/// Randomly drops non-essential entries until each layer fits its cap.
///
/// Removal is an unweighted shuffle and ignores ownership weights.
pub fn trim_to_caps<R: Rng + ?Sized>(
    bundle: &mut TraitBundle,
    config: &InheritanceConfig,
    rng: &mut R,
) {
    for (layer, cap) in [
        (TraitLayer::Germline, config.max_germline),
        (TraitLayer::Xeno, config.max_xeno),
    ] {
        let entries = bundle.layer_mut(layer);
        if entries.len() <= cap {
            continue;
        }
        let mut removable: Vec<String> = entries
            .iter()
            .filter(|e| !config.essential_traits.contains(&e.def.name))
            .map(|e| e.def.name.clone())
            .collect();
        removable.shuffle(rng);
        let excess = entries.len() - cap;
        let doomed: Vec<String> = removable.into_iter().take(excess).collect();
        entries.retain(|e| !doomed.contains(&e.def.name));
        tracing::debug!(?layer, removed = doomed.len(), cap, "Trimmed trait bundle");
    }
}

/// Applies the bundle to an empty genome, resolving exclusion conflicts.
///
/// A trait drops out when any conflicting trait from a different source
/// weighs strictly more, whether or not that rival is kept itself. The rest
/// are placed in bundle order, and a trait that conflicts with one already
/// held is skipped. Ties and same-source conflicts therefore keep the
/// incumbent.
pub fn resolve_offspring_traits(bundle: &TraitBundle, weights: &DonorWeights) -> TraitBundle {
    let mut held = TraitBundle::default();
    for (layer, entry) in bundle.entries() {
        let incoming = weights.of_entry(entry);
        let heavier = bundle.entries().find(|(_, rival)| {
            !rival.same_source(entry)
                && rival.def.conflicts_with(&entry.def)
                && weights.of_entry(rival) > incoming
        });
        if let Some((_, rival)) = heavier {
            tracing::trace!(
                trait_name = %entry.def.name,
                rival = %rival.def.name,
                incoming,
                "Trait lost conflict"
            );
            continue;
        }
        if held.entries().any(|(_, h)| h.def.conflicts_with(&entry.def)) {
            tracing::trace!(trait_name = %entry.def.name, "Incumbent trait kept");
            continue;
        }
        held.layer_mut(layer).push(entry.clone());
    }
    held
}

/// Makes the held cosmetic traits match `parent` exactly.
///
/// Cosmetic traits the chosen parent lacks are dropped; the parent's own
/// cosmetic traits are added (displacing anything they conflict with)
/// unless they are excluded from inheritance or their layer is disabled.
pub fn sync_cosmetics(
    held: &mut TraitBundle,
    parent: &Genome,
    donor: Donor,
    config: &InheritanceConfig,
) {
    for layer in [TraitLayer::Germline, TraitLayer::Xeno] {
        held.layer_mut(layer)
            .retain(|e| !e.def.cosmetic || parent.has(&e.def.name));
    }

    for layer in [TraitLayer::Germline, TraitLayer::Xeno] {
        if !layer_enabled(layer, config) {
            continue;
        }
        for def in parent.layer(layer).iter().filter(|d| d.cosmetic) {
            if held.contains(&def.name) || is_excluded(def, config) {
                continue;
            }
            for l in [TraitLayer::Germline, TraitLayer::Xeno] {
                held.layer_mut(l).retain(|h| !h.def.conflicts_with(def));
            }
            held.layer_mut(layer).push(BundleEntry {
                def: def.clone(),
                from_a: donor == Donor::A,
                from_b: donor == Donor::B,
            });
        }
    }
}

/// Plain genome from a resolved bundle.
pub fn to_genome(held: &TraitBundle) -> Genome {
    Genome {
        germline: held.germline.iter().map(|e| e.def.clone()).collect(),
        xeno: held.xeno.iter().map(|e| e.def.clone()).collect(),
    }
}
