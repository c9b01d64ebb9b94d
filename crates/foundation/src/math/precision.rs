//! Deterministic float ordering for spatial sorts.

use core::cmp::Ordering;

/// Total order over coordinates that treats `-0.0` and `0.0` as equal and
/// sorts every NaN after every number.
///
/// KD-tree construction sorts on this so two builds over the same stations
/// always pick the same split points.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // `partial_cmp` is total on non-NaN values and equates the two zeros.
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
