//! Per-tick resource extraction from grid squares.

/// Default amount a completed building extracts per tick.
pub const DEFAULT_RATE_PER_TICK: f64 = 0.1;

/// Amount extracted from a square holding `available` of the resource.
///
/// Absent or exhausted deposits yield nothing; the result never exceeds
/// what is available.
pub fn extraction_amount(available: Option<f64>, rate: f64) -> f64 {
    match available {
        Some(amount) if amount > 0.0 && rate > 0.0 => rate.min(amount),
        _ => 0.0,
    }
}

/// Extract from a deposit in place. Returns the amount moved out.
pub fn extract(deposit: &mut Option<f64>, rate: f64) -> f64 {
    let taken = extraction_amount(*deposit, rate);
    if let Some(amount) = deposit.as_mut() {
        *amount = (*amount - taken).max(0.0);
    }
    taken
}
