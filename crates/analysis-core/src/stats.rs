//! Small statistics helpers shared by the ranking and valuation engines.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Convert a 1-based rank among `total` entries into a 0-100 position where
/// 100 is best. Returns `None` when not ranked or when there is nobody to
/// compare against.
pub fn percentile_position(rank: usize, total: usize) -> Option<f64> {
    if rank == 0 || total < 2 || rank > total {
        return None;
    }
    Some((total - rank) as f64 / (total - 1) as f64 * 100.0)
}

/// Present value of 1 per period over `periods` periods at `rate`
/// (ordinary annuity). Falls back to `periods` when the rate is zero.
pub fn annuity_factor(rate: f64, periods: u32) -> f64 {
    if rate.abs() < f64::EPSILON {
        return periods as f64;
    }
    (1.0 - (1.0 + rate).powi(-(periods as i32))) / rate
}
