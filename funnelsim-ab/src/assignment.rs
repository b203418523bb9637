//! Deterministic variant assignment.
//!
//! `SHA-256("{experiment_id}:{user_id}")`, first 8 bytes big-endian, scaled
//! into `[0, 1)`, then mapped onto the cumulative variant weights. Including
//! the experiment id in the key re-randomizes every user per experiment.

use sha2::{Digest, Sha256};

use crate::experiment::Experiment;

/// 2^64 as `f64`.
const BUCKET_SCALE: f64 = 18_446_744_073_709_551_616.0;

/// Stable position of `user_id` in `[0, 1)` for one experiment.
pub fn bucket_for(experiment_id: &str, user_id: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(experiment_id.as_bytes());
    hasher.update(b":");
    hasher.update(user_id.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix) as f64 / BUCKET_SCALE
}

/// Returns the name of the variant `user_id` belongs to.
///
/// Never fails: when rounding leaves the cumulative weight a hair short of
/// the bucket, the last variant is returned.
pub fn assign_variant<'a>(experiment: &'a Experiment, user_id: &str) -> &'a str {
    let bucket = bucket_for(experiment.experiment_id(), user_id);

    let mut cumulative = 0.0;
    for variant in experiment.variants() {
        cumulative += variant.weight();
        if bucket < cumulative {
            return variant.name();
        }
    }

    // Experiment::new guarantees at least two variants.
    experiment
        .variants()
        .last()
        .map(|v| v.name())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{Variant, PRICING_PAGE_EXPERIMENT};
    use proptest::prelude::*;

    fn experiment(id: &str, variants: &[(&str, f64)]) -> Experiment {
        Experiment::new(
            id,
            id.to_uppercase(),
            variants.iter().map(|(n, w)| Variant::new(*n, *w)).collect(),
            "purchase",
        )
        .unwrap()
    }

    fn count(exp: &Experiment, variant: &str, users: usize) -> usize {
        (0..users)
            .filter(|i| assign_variant(exp, &format!("user_{}", i)) == variant)
            .count()
    }

    #[test]
    fn deterministic() {
        let exp = &*PRICING_PAGE_EXPERIMENT;
        assert_eq!(assign_variant(exp, "user_001"), assign_variant(exp, "user_001"));
        assert_eq!(exp.assign("user_001"), assign_variant(exp, "user_001"));
    }

    #[test]
    fn bucket_matches_reference_construction() {
        let digest = Sha256::digest(b"exp_pricing_page_v1:user_001");
        let raw = u64::from_be_bytes(digest[..8].try_into().unwrap());
        let expected = raw as f64 / 2f64.powi(64);
        assert_eq!(bucket_for("exp_pricing_page_v1", "user_001"), expected);
    }

    #[test]
    fn different_users_reach_both_variants() {
        let exp = &*PRICING_PAGE_EXPERIMENT;
        let seen: std::collections::HashSet<_> = (0..100)
            .map(|i| assign_variant(exp, &format!("user_{}", i)))
            .collect();
        assert!(seen.contains("control"));
        assert!(seen.contains("treatment"));
    }

    #[test]
    fn roughly_even_split() {
        let control = count(&PRICING_PAGE_EXPERIMENT, "control", 10_000);
        assert!((4500..=5500).contains(&control), "control = {}", control);
    }

    #[test]
    fn uneven_split() {
        let exp = experiment("uneven", &[("heavy", 0.9), ("light", 0.1)]);
        let heavy = count(&exp, "heavy", 10_000);
        assert!((8500..=9500).contains(&heavy), "heavy = {}", heavy);
    }

    #[test]
    fn experiments_randomize_independently() {
        let exp_a = experiment("exp_a", &[("c", 0.5), ("t", 0.5)]);
        let exp_b = experiment("exp_b", &[("c", 0.5), ("t", 0.5)]);
        let differ = (0..100).any(|i| {
            let uid = format!("user_{}", i);
            assign_variant(&exp_a, &uid) != assign_variant(&exp_b, &uid)
        });
        assert!(differ);
    }

    #[test]
    fn zero_weight_variant_never_assigned() {
        let exp = experiment("zero", &[("never", 0.0), ("always", 1.0)]);
        assert_eq!(count(&exp, "never", 1_000), 0);
    }

    #[test]
    fn short_weight_sum_falls_back_to_last_variant() {
        // Sums to 0.9995: inside tolerance, leaves a sliver of buckets uncovered.
        let exp = experiment("short", &[("a", 0.4995), ("b", 0.5)]);
        let uncovered = (0..100_000)
            .map(|i| format!("user_{}", i))
            .find(|uid| bucket_for("short", uid) >= 0.9995)
            .expect("some bucket lands past the weight sum");
        assert_eq!(assign_variant(&exp, &uncovered), "b");
    }

    proptest! {
        #[test]
        fn bucket_in_unit_interval(exp_id in "[a-z0-9_]{1,16}", user in ".{0,32}") {
            let bucket = bucket_for(&exp_id, &user);
            prop_assert!((0.0..=1.0).contains(&bucket));
        }

        #[test]
        fn always_returns_declared_variant(user in ".{0,32}", split in 0.0f64..=1.0) {
            let exp = experiment("prop", &[("left", split), ("right", 1.0 - split)]);
            let got = assign_variant(&exp, &user);
            prop_assert!(got == "left" || got == "right");
        }
    }
}
