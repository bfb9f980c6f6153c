use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use synthesis_lib::model::config::InheritanceConfig;
use synthesis_lib::model::inheritance::{
    build_trait_bundle, donor_complexity, resolve_offspring_traits, Donor, DonorWeights,
};
use synthesis_lib::model::state::{BundleEntry, Genome, TraitDef};

const TAGS: [&str; 3] = ["skin", "build", "voice"];

prop_compose! {
    fn arb_trait(prefix: &'static str)(
        idx in 0usize..10,
        complexity in -2i32..8,
        tags in prop::collection::btree_set(0usize..TAGS.len(), 0..=2),
        inheritable in prop::bool::weighted(0.85),
    ) -> TraitDef {
        let mut def = TraitDef::new(format!("{prefix}{idx}"), complexity);
        for t in tags {
            def = def.with_exclusion(TAGS[t]);
        }
        if !inheritable {
            def = def.non_inheritable();
        }
        def
    }
}

fn dedup(defs: Vec<TraitDef>) -> Vec<TraitDef> {
    let mut seen = HashSet::new();
    defs.into_iter().filter(|d| seen.insert(d.name.clone())).collect()
}

prop_compose! {
    fn arb_genome()(
        germline in prop::collection::vec(arb_trait("G"), 0..8),
        xeno in prop::collection::vec(arb_trait("X"), 0..5),
    ) -> Genome {
        Genome { germline: dedup(germline), xeno: dedup(xeno) }
    }
}

proptest! {
    #[test]
    fn union_has_no_duplicates_or_excluded(a in arb_genome(), b in arb_genome(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bundle = build_trait_bundle(&a, &b, &InheritanceConfig::default(), &mut rng);

        let mut names = HashSet::new();
        for (_, entry) in bundle.entries() {
            prop_assert!(names.insert(entry.name().to_string()), "duplicate {}", entry.name());
            prop_assert!(entry.def.inheritable);
            prop_assert!(entry.from_a || entry.from_b);
        }
        for def in a.all().chain(b.all()).filter(|d| d.inheritable) {
            prop_assert!(bundle.contains(&def.name));
        }
    }

    #[test]
    fn simpler_donor_weighs_more_and_wins(a in arb_genome(), b in arb_genome(), seed in any::<u64>()) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bundle = build_trait_bundle(&a, &b, &InheritanceConfig::default(), &mut rng);
        let weights = DonorWeights::from_bundle(&bundle, 100.0);

        let (ca, cb) = (donor_complexity(&bundle, Donor::A), donor_complexity(&bundle, Donor::B));
        if ca < cb {
            prop_assert!(weights.a >= weights.b);
        }
        if cb < ca {
            prop_assert!(weights.b >= weights.a);
        }

        let held = resolve_offspring_traits(&bundle, &weights);
        let (winner, loser) = if weights.a > weights.b {
            (Donor::A, Donor::B)
        } else if weights.b > weights.a {
            (Donor::B, Donor::A)
        } else {
            return Ok(());
        };
        let only = |e: &BundleEntry, d: Donor| match d {
            Donor::A => e.from_a && !e.from_b,
            Donor::B => e.from_b && !e.from_a,
        };

        for (_, survivor) in held.entries().filter(|(_, e)| only(e, loser)) {
            let beaten = bundle
                .entries()
                .any(|(_, rival)| only(rival, winner) && rival.def.conflicts_with(&survivor.def));
            prop_assert!(!beaten, "{} survived a conflict it should lose", survivor.name());
        }

        // No two held traits conflict.
        let held_entries: Vec<_> = held.entries().map(|(_, e)| e).collect();
        for (i, x) in held_entries.iter().enumerate() {
            for y in &held_entries[i + 1..] {
                prop_assert!(!x.def.conflicts_with(&y.def));
            }
        }
    }

    #[test]
    fn trimming_respects_caps(a in arb_genome(), b in arb_genome(), cap in 1usize..6, seed in any::<u64>()) {
        let config = InheritanceConfig {
            trim_to_caps: true,
            max_germline: cap,
            max_xeno: cap,
            essential_traits: vec!["G0".into()],
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let untrimmed = build_trait_bundle(&a, &b, &InheritanceConfig::default(), &mut rng);
        let bundle = build_trait_bundle(&a, &b, &config, &mut rng);

        prop_assert!(bundle.xeno.len() <= cap);
        prop_assert!(bundle.germline.len() <= cap);
        if untrimmed.contains("G0") {
            prop_assert!(bundle.contains("G0"));
        }
    }
}
