use std::collections::BTreeMap;

use serde::Serialize;

use crate::recommendation::criteria::Criterion;

/// Numeric importance per criterion. A criterion without an entry weighs 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<Criterion, f64>);

impl WeightMap {
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0.get(&criterion).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
impl WeightMap {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

/// Linear-rank weights: position `i` of `n` gets `2(n - i) / (n(n + 1))`.
///
/// Earlier criteria weigh strictly more and a full order sums to 1.
/// An empty order yields an empty map.
pub fn generate_weights(order: &[Criterion]) -> WeightMap {
    let n = order.len() as f64;
    let denominator = n * (n + 1.0);

    let weights = order
        .iter()
        .enumerate()
        .map(|(i, criterion)| (*criterion, 2.0 * (n - i as f64) / denominator))
        .collect();

    WeightMap(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::criteria::DEFAULT_PREFERENCE_ORDER;

    const EPS: f64 = 1e-9;

    fn permutations(items: &[Criterion]) -> Vec<Vec<Criterion>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut result = Vec::new();
        for (i, head) in items.iter().enumerate() {
            let mut rest = items.to_vec();
            rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, *head);
                result.push(tail);
            }
        }
        result
    }

    #[test]
    fn test_every_full_order_sums_to_one() {
        let orders = permutations(&DEFAULT_PREFERENCE_ORDER);
        assert_eq!(orders.len(), 24);
        for order in orders {
            let total = generate_weights(&order).total();
            assert!((total - 1.0).abs() < EPS, "{order:?} summed to {total}");
        }
    }

    #[test]
    fn test_weights_strictly_decrease_by_position() {
        for order in permutations(&DEFAULT_PREFERENCE_ORDER) {
            let weights = generate_weights(&order);
            for pair in order.windows(2) {
                assert!(weights.get(pair[0]) > weights.get(pair[1]));
            }
        }
    }

    #[test]
    fn test_salary_first_order() {
        let weights = generate_weights(&[
            Criterion::Salary,
            Criterion::Distance,
            Criterion::Categories,
            Criterion::Reputation,
        ]);
        assert!((weights.get(Criterion::Salary) - 0.4).abs() < EPS);
        assert!((weights.get(Criterion::Distance) - 0.3).abs() < EPS);
        assert!((weights.get(Criterion::Categories) - 0.2).abs() < EPS);
        assert!((weights.get(Criterion::Reputation) - 0.1).abs() < EPS);
    }

    #[test]
    fn test_empty_order_yields_empty_map() {
        let weights = generate_weights(&[]);
        assert!(weights.is_empty());
        assert_eq!(weights.get(Criterion::Distance), 0.0);
    }

    #[test]
    fn test_partial_order_leaves_unlisted_at_zero() {
        let weights = generate_weights(&[Criterion::Reputation, Criterion::Salary]);
        assert_eq!(weights.len(), 2);
        // 2*2/6 and 2*1/6
        assert!((weights.get(Criterion::Reputation) - 2.0 / 3.0).abs() < EPS);
        assert!((weights.get(Criterion::Salary) - 1.0 / 3.0).abs() < EPS);
        assert_eq!(weights.get(Criterion::Distance), 0.0);
        assert_eq!(weights.get(Criterion::Categories), 0.0);
    }

    #[test]
    fn test_single_criterion_takes_all_weight() {
        let weights = generate_weights(&[Criterion::Categories]);
        assert_eq!(weights.get(Criterion::Categories), 1.0);
    }

    #[test]
    fn test_deterministic() {
        let order = [Criterion::Distance, Criterion::Reputation];
        assert_eq!(generate_weights(&order), generate_weights(&order));
    }
}
