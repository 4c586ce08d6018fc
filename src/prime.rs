//! Prime capacities for the table

/// Returns true if `n` is prime, by trial division over every odd divisor up to `√n`
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn is_prime(n: usize) -> bool {
    match n {
        0 | 1 => false,
        2 | 3 => true,
        _ if n % 2 == 0 => false,
        _ => (3..=n.isqrt()).step_by(2).all(|divisor| n % divisor != 0),
    }
}

/// Smallest prime greater than or equal to `n`
#[must_use]
pub fn next_prime(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate = candidate.saturating_add(1);
    }
    candidate
}

/// Capacity after a resize: the smallest prime `≥ 2·capacity + 1`
#[must_use]
pub fn grown_capacity(capacity: usize) -> usize {
    next_prime(capacity.saturating_mul(2).saturating_add(1))
}
