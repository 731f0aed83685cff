// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Route scoring and ordering
//!
//! Formulas:
//!
//! - `total_strength` = mean edge strength along the path
//! - `efficiency` = `best_hops / hops` over the candidate set, in `(0, 1]`
//! - `success_probability` = weighted mean of `total_strength / MAX_STRENGTH`
//!   and `efficiency`, clamped to `[0, 1]`
//! - `estimated_days` = `BASE_DAYS + hops × DAYS_PER_HOP + shift`, rounded up,
//!   where `shift` = mean of `pace(category) - 1` clamped to
//!   `±MAX_PACE_SHIFT`, times `DAYS_PER_HOP - 1`. The shift spread stays under
//!   one hop, so every extra hop adds at least a full day.
//!
//! Ordering: success probability desc, hop count asc, total strength desc,
//! then node ids for a stable result.

use crate::types::{Category, CategoryCode, Path, RankedPath, MAX_STRENGTH};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Weight of normalized mean strength in the success estimate
pub const DEFAULT_STRENGTH_WEIGHT: f64 = 0.7;
/// Weight of efficiency in the success estimate
pub const DEFAULT_EFFICIENCY_WEIGHT: f64 = 0.3;
/// Fixed lead time of any introduction, in days
pub const DEFAULT_BASE_DAYS: f64 = 2.0;
/// Days added per intermediary hop before category pace
pub const DEFAULT_DAYS_PER_HOP: f64 = 5.0;
/// Bound on the mean pace deviation from 1.0 that feeds the day estimate
pub const MAX_PACE_SHIFT: f64 = 0.4;

/// Pace multiplier for unknown or unset categories
pub const PACE_UNSET: f64 = 1.2;
/// Pace multiplier for acquaintances
pub const PACE_ACQUAINTANCE: f64 = 1.4;
/// Pace multiplier for vendor/client and investment relations
pub const PACE_BUSINESS: f64 = 1.0;
/// Pace multiplier for shareholders
pub const PACE_SHAREHOLDER: f64 = 0.9;
/// Pace multiplier for partners
pub const PACE_PARTNER: f64 = 0.8;
/// Pace multiplier for friends
pub const PACE_FRIEND: f64 = 0.6;

/// Ranking weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of normalized mean strength
    pub strength_weight: f64,
    /// Weight of efficiency
    pub efficiency_weight: f64,
    /// Fixed lead time in days
    pub base_days: f64,
    /// Days per hop
    pub days_per_hop: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strength_weight: DEFAULT_STRENGTH_WEIGHT,
            efficiency_weight: DEFAULT_EFFICIENCY_WEIGHT,
            base_days: DEFAULT_BASE_DAYS,
            days_per_hop: DEFAULT_DAYS_PER_HOP,
        }
    }
}

/// How quickly an introduction over a hop of this category tends to move
#[must_use]
pub fn category_pace(category: CategoryCode) -> f64 {
    match category.known() {
        Some(Category::Friend) => PACE_FRIEND,
        Some(Category::Partner) => PACE_PARTNER,
        Some(Category::Shareholder) => PACE_SHAREHOLDER,
        Some(Category::VendorClient | Category::InvestmentTarget) => PACE_BUSINESS,
        Some(Category::Acquaintance) => PACE_ACQUAINTANCE,
        Some(Category::Unset) | None => PACE_UNSET,
    }
}

/// Mean edge strength along a path
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_strength(path: &Path) -> f64 {
    if path.hops.is_empty() {
        return 0.0;
    }
    path.hops.iter().map(|h| h.strength).sum::<f64>() / path.hops.len() as f64
}

/// Success estimate from mean strength and efficiency
#[must_use]
pub fn success_probability(total_strength: f64, efficiency: f64, config: &RankingConfig) -> f64 {
    let weights = config.strength_weight + config.efficiency_weight;
    if weights <= 0.0 {
        return 0.0;
    }
    let strength = (total_strength / MAX_STRENGTH).clamp(0.0, 1.0);
    let score = (config.strength_weight * strength + config.efficiency_weight * efficiency) / weights;
    score.clamp(0.0, 1.0)
}

/// Elapsed time estimate for a path
///
/// `days_per_hop` must be at least 1 for the estimate to grow strictly with
/// hop count; [`crate::config::EngineConfig::validate`] enforces it.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn estimated_days(path: &Path, config: &RankingConfig) -> u32 {
    let hops = path.hops.len();
    if hops == 0 {
        return config.base_days.max(0.0).ceil() as u32;
    }
    let mean_shift = path
        .hops
        .iter()
        .map(|h| category_pace(h.category) - 1.0)
        .sum::<f64>()
        / hops as f64;
    let shift = mean_shift.clamp(-MAX_PACE_SHIFT, MAX_PACE_SHIFT) * (config.days_per_hop - 1.0).max(0.0);
    let days = config.base_days + hops as f64 * config.days_per_hop + shift;
    // absorb float noise so 10.000000000000002 does not round up to 11
    (days - 1e-9).max(0.0).ceil() as u32
}

/// Rank paths with the default weights
#[must_use]
pub fn rank(paths: Vec<Path>) -> Vec<RankedPath> {
    rank_with(paths, &RankingConfig::default())
}

/// Score and order paths best-first; the first one is recommended
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rank_with(paths: Vec<Path>, config: &RankingConfig) -> Vec<RankedPath> {
    let best_hops = paths
        .iter()
        .map(Path::hop_count)
        .filter(|h| *h > 0)
        .min()
        .unwrap_or(1);

    let mut ranked: Vec<RankedPath> = paths
        .into_iter()
        .map(|path| {
            let hop_count = path.hop_count();
            let total_strength = mean_strength(&path);
            let efficiency = if hop_count == 0 {
                0.0
            } else {
                (best_hops as f64 / hop_count as f64).clamp(0.0, 1.0)
            };
            RankedPath {
                rank: 0,
                recommended: false,
                success_probability: success_probability(total_strength, efficiency, config),
                estimated_days: estimated_days(&path, config),
                hop_count,
                total_strength,
                efficiency,
                path,
            }
        })
        .collect();

    ranked.sort_by(compare);
    for (position, entry) in ranked.iter_mut().enumerate() {
        entry.rank = position + 1;
        entry.recommended = position == 0;
    }
    ranked
}

fn compare(a: &RankedPath, b: &RankedPath) -> Ordering {
    b.success_probability
        .total_cmp(&a.success_probability)
        .then_with(|| a.hop_count.cmp(&b.hop_count))
        .then_with(|| b.total_strength.total_cmp(&a.total_strength))
        .then_with(|| a.path.nodes.cmp(&b.path.nodes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Hop, ProvenanceKind};

    fn path(strengths: &[f64], category: Category) -> Path {
        let nodes: Vec<String> = (0..=strengths.len()).map(|i| format!("n{i}")).collect();
        let hops = strengths
            .iter()
            .enumerate()
            .map(|(i, s)| Hop {
                from: nodes[i].clone(),
                to: nodes[i + 1].clone(),
                edge_id: format!("edge:{i}"),
                strength: *s,
                category: category.code(),
                provenance: ProvenanceKind::Connection,
            })
            .collect();
        Path { nodes, hops, cost: 0.0 }
    }

    #[test]
    fn test_single_path_scores() {
        let ranked = rank(vec![path(&[4.0, 5.0], Category::Partner)]);
        assert_eq!(ranked.len(), 1);
        let top = &ranked[0];
        assert!(top.recommended);
        assert_eq!(top.rank, 1);
        assert_eq!(top.hop_count, 2);
        assert!((top.total_strength - 4.5).abs() < 1e-12);
        assert!((top.efficiency - 1.0).abs() < 1e-12);
        // 0.7 * 0.9 + 0.3 * 1.0
        assert!((top.success_probability - 0.93).abs() < 1e-9);
        // 2 + 2 * 5 + (0.8 - 1) * 4
        assert_eq!(top.estimated_days, 12);
    }

    #[test]
    fn test_efficiency_relative_to_best_hop_count() {
        let ranked = rank(vec![
            path(&[5.0, 5.0, 5.0, 5.0], Category::Friend),
            path(&[3.0, 3.0], Category::Friend),
        ]);
        let long = ranked.iter().find(|r| r.hop_count == 4).unwrap();
        let short = ranked.iter().find(|r| r.hop_count == 2).unwrap();
        assert!((long.efficiency - 0.5).abs() < 1e-12);
        assert!((short.efficiency - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ordering_and_recommendation() {
        let ranked = rank(vec![
            path(&[2.0, 2.0], Category::Unset),
            path(&[5.0, 5.0], Category::Unset),
            path(&[5.0, 5.0, 5.0], Category::Unset),
        ]);
        assert_eq!(ranked[0].total_strength, 5.0);
        assert_eq!(ranked[0].hop_count, 2);
        assert!(ranked[0].recommended);
        assert!(!ranked[1].recommended);
        assert!(ranked.windows(2).all(|w| w[0].success_probability >= w[1].success_probability));
    }

    #[test]
    fn test_tie_breaks_on_fewer_hops() {
        let config = RankingConfig {
            efficiency_weight: 0.0,
            ..RankingConfig::default()
        };
        let ranked = rank_with(
            vec![path(&[4.0, 4.0, 4.0], Category::Unset), path(&[4.0, 4.0], Category::Unset)],
            &config,
        );
        assert_eq!(ranked[0].hop_count, 2);
    }

    #[test]
    fn test_days_grow_with_hops() {
        let config = RankingConfig::default();
        let mut previous = 0;
        for hops in 1..6 {
            let days = estimated_days(&path(&vec![3.0; hops], Category::Friend), &config);
            assert!(days > previous);
            previous = days;
        }
    }

    #[test]
    fn test_slow_single_hop_beats_fast_double_hop() {
        let one = rank(vec![path(&[3.0], Category::Acquaintance)]);
        let two = rank(vec![path(&[3.0, 3.0], Category::Friend)]);
        // 2 + 5 + 0.4 * 4 and 2 + 10 - 0.4 * 4
        assert_eq!(one[0].estimated_days, 9);
        assert_eq!(two[0].estimated_days, 11);

        let mixed = rank(vec![
            path(&[3.0], Category::Acquaintance),
            path(&[3.0, 3.0], Category::Friend),
        ]);
        let short = mixed.iter().find(|r| r.hop_count == 1).unwrap();
        let long = mixed.iter().find(|r| r.hop_count == 2).unwrap();
        assert!(long.estimated_days > short.estimated_days);
    }

    #[test]
    fn test_days_grow_with_hops_at_minimum_pace_rate() {
        let config = RankingConfig {
            days_per_hop: 1.0,
            ..RankingConfig::default()
        };
        let one = estimated_days(&path(&[3.0], Category::Acquaintance), &config);
        let two = estimated_days(&path(&[3.0, 3.0], Category::Friend), &config);
        assert!(two > one);
    }

    #[test]
    fn test_unknown_category_pace() {
        assert_eq!(category_pace(CategoryCode(99)), PACE_UNSET);
        assert_eq!(category_pace(Category::Friend.code()), PACE_FRIEND);
    }

    #[test]
    fn test_probability_is_clamped() {
        let config = RankingConfig::default();
        assert_eq!(success_probability(50.0, 1.0, &config), 1.0);
        assert_eq!(success_probability(-3.0, 0.0, &config), 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
