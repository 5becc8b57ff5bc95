//! Lenient numeric parsing
//!
//! Exported data pipelines expect a value for every cell, so a token that
//! is not a valid number reads as zero instead of failing the query.
//! Every number read out of a tree goes through these two functions.

/// Parse a float token, yielding `0.0` when it is not a valid float
pub fn lenient_f64(token: &str) -> f64 {
    token.parse().unwrap_or(0.0)
}

/// Parse a count token, yielding `0` when it is not a valid unsigned integer
pub fn lenient_usize(token: &str) -> usize {
    token.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_f64() {
        assert_eq!(lenient_f64("1.5"), 1.5);
        assert_eq!(lenient_f64("-0.033333"), -0.033333);
        assert_eq!(lenient_f64("1e-3"), 0.001);
        assert_eq!(lenient_f64("abc"), 0.0);
        assert_eq!(lenient_f64(""), 0.0);
        assert_eq!(lenient_f64("1,5"), 0.0);
    }

    #[test]
    fn test_lenient_usize() {
        assert_eq!(lenient_usize("6"), 6);
        assert_eq!(lenient_usize("-3"), 0);
        assert_eq!(lenient_usize("3.0"), 0);
        assert_eq!(lenient_usize("x"), 0);
    }
}
