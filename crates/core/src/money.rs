//! Amounts are `u64` in the smallest currency unit (e.g. cents).

pub const DEFAULT_CURRENCY: &str = "USD";

/// `amount * basis_points / 10_000`, rounded half up.
///
/// 1500 basis points is 15%.
pub fn percent_of(amount: u64, basis_points: u32) -> u64 {
    let scaled = u128::from(amount) * u128::from(basis_points);
    ((scaled + 5_000) / 10_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_percent_rounds_half_up() {
        assert_eq!(percent_of(10_000, 1_500), 1_500);
        assert_eq!(percent_of(333, 1_500), 50); // 49.95
        assert_eq!(percent_of(0, 1_500), 0);
    }
}
