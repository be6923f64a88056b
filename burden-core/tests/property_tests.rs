//! Property-based tests for the statistical core.

use proptest::prelude::*;

use burden_core::aggregate::{dominant_scores, recessive_scores, GeneVariant, ModelParams};
use burden_core::regress::lrt_pvalue;
use burden_core::shard::shard;

proptest! {
    /// Shard slices are disjoint, contiguous, cover the input exactly,
    /// and differ in size by at most one.
    #[test]
    fn shard_partitions_exactly(n_items in 0usize..500, total_tasks in 1usize..20) {
        let mut cursor = 0;
        let mut sizes = Vec::new();
        for task in 0..total_tasks {
            let (start, end) = shard(n_items, total_tasks, task);
            prop_assert_eq!(start, cursor);
            prop_assert!(end >= start);
            sizes.push(end - start);
            cursor = end;
        }
        prop_assert_eq!(cursor, n_items);
        let min = sizes.iter().min().copied().unwrap_or(0);
        let max = sizes.iter().max().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    /// The same task always claims the same slice.
    #[test]
    fn shard_is_deterministic(n_items in 0usize..500, total_tasks in 1usize..20, task in 0usize..20) {
        prop_assume!(task < total_tasks);
        prop_assert_eq!(
            shard(n_items, total_tasks, task),
            shard(n_items, total_tasks, task)
        );
    }
}

/// A genotype probability triple over 0/1/2 non-reference copies.
fn prob_triple() -> impl Strategy<Value = [f64; 3]> {
    (0.01f64..1.0, 0.01f64..1.0, 0.01f64..1.0).prop_map(|(a, b, c)| {
        let s = a + b + c;
        [a / s, b / s, c / s]
    })
}

fn gene_variants() -> impl Strategy<Value = Vec<GeneVariant>> {
    let variant = (0.0f64..0.999, prop::collection::vec(prob_triple(), 6))
        .prop_map(|(effect_score, probs)| GeneVariant {
            effect_score,
            probs,
        });
    prop::collection::vec(variant, 1..6)
}

fn model_params() -> impl Strategy<Value = ModelParams> {
    (0.0f64..=1.0, 1.0f64..4.0, 0.0f64..=1.0, 1.0f64..4.0, 1.0f64..4.0).prop_map(
        |(mu_d, p_d, mu_r, p_r, q_r)| ModelParams {
            mu_d,
            p_d,
            mu_r,
            p_r,
            q_r,
        },
    )
}

proptest! {
    /// Aggregated scores always land in [0, 1).
    #[test]
    fn aggregated_scores_bounded(variants in gene_variants(), params in model_params()) {
        params.validate().unwrap();
        let dom = dominant_scores(&variants, &params).unwrap();
        let rec = recessive_scores(&variants, &params).unwrap();
        for s in dom.iter().chain(rec.iter()) {
            prop_assert!((0.0..1.0).contains(s), "score {} out of [0, 1)", s);
        }
    }

    /// Scaling every effect score down never increases any score.
    #[test]
    fn aggregation_monotone_in_effect(variants in gene_variants(), params in model_params()) {
        let weaker: Vec<GeneVariant> = variants
            .iter()
            .map(|v| GeneVariant {
                effect_score: v.effect_score * 0.5,
                probs: v.probs.clone(),
            })
            .collect();
        let strong = dominant_scores(&variants, &params).unwrap();
        let weak = dominant_scores(&weaker, &params).unwrap();
        for (s, w) in strong.iter().zip(weak.iter()) {
            prop_assert!(w <= &(s + 1e-12));
        }
    }

    /// LRT p-values are probabilities for any pair of log-likelihoods.
    #[test]
    fn lrt_pvalue_bounded(ll0 in -1e4f64..0.0, ll1 in -1e4f64..0.0) {
        let p = lrt_pvalue(ll0, ll1);
        prop_assert!((0.0..=1.0).contains(&p));
    }
}
