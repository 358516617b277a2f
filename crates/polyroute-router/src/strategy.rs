//! Deterministic ordering algorithms for the three `RoutingStrategy`
//! types (§4.1 step 4). Weighted selection uses the A-Res
//! weighted-reservoir algorithm seeded by a monotonic counter so ordering
//! is reproducible given the same seed (§8 scenario 6).

/// splitmix64, used only to turn an integer seed into a reproducible
/// pseudo-random float stream; not a cryptographic RNG.
fn splitmix64_next(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn next_unit_f64(state: &mut u64) -> f64 {
    let bits = splitmix64_next(state);
    (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Rotates `items` left by `counter mod len`, implementing round-robin
/// selection driven by a per-(project, clientType) atomic counter.
pub fn round_robin_order<T>(mut items: Vec<T>, counter: u64) -> Vec<T> {
    if items.is_empty() {
        return items;
    }
    let shift = (counter as usize) % items.len();
    items.rotate_left(shift);
    items
}

/// Orders `items` by descending A-Res key `u^(1/weight)`, `u` drawn from a
/// per-item stream seeded from `seed` — the provider with a higher weight
/// is more likely (but not guaranteed) to sort first.
pub fn weighted_order<T>(items: Vec<T>, weight_of: impl Fn(&T) -> u32, seed: u64) -> Vec<T> {
    let mut keyed: Vec<(f64, T)> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let weight = weight_of(&item).max(1) as f64;
            let mut state = seed ^ splitmix64_next(&mut (index as u64 + 1));
            let u = next_unit_f64(&mut state).max(f64::MIN_POSITIVE);
            let key = u.powf(1.0 / weight);
            (key, item)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).expect("keys are never NaN"));
    keyed.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_rotates_by_counter() {
        let items = vec!["a", "b", "c"];
        assert_eq!(round_robin_order(items.clone(), 0), vec!["a", "b", "c"]);
        assert_eq!(round_robin_order(items.clone(), 1), vec!["b", "c", "a"]);
        assert_eq!(round_robin_order(items, 4), vec!["b", "c", "a"]);
    }

    #[test]
    fn weighted_order_is_deterministic_for_fixed_seed() {
        let items = vec![("p1", 3u32), ("p2", 1u32)];
        let first = weighted_order(items.clone(), |(_, w)| *w, 42);
        let second = weighted_order(items, |(_, w)| *w, 42);
        assert_eq!(first, second);
    }

    #[test]
    fn weighted_distribution_favors_heavier_weight_over_many_trials() {
        let mut p1_first = 0;
        for trial in 0..400u64 {
            let ordered = weighted_order(vec![("p1", 3u32), ("p2", 1u32)], |(_, w)| *w, trial);
            if ordered[0].0 == "p1" {
                p1_first += 1;
            }
        }
        assert!(p1_first >= 280 && p1_first <= 320, "p1 selected {p1_first} times");
    }
}
