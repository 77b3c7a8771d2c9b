//! Process-level configuration read from the environment.

/// Overrides the desktop scale factor of standalone windows.
pub const SCALE_FACTOR_ENV: &str = "FENESTRA_SCALE_FACTOR";

/// Parses a scale factor override; anything below `1.0` is raised to `1.0`.
pub fn parse_scale_factor(value: &str) -> Option<f64> {
    let factor = value.trim().parse::<f64>().ok()?;
    if !factor.is_finite() {
        return None;
    }
    Some(factor.max(1.0))
}

/// Reads [`SCALE_FACTOR_ENV`], ignoring unset or malformed values.
pub fn scale_factor_from_env() -> Option<f64> {
    let value = std::env::var(SCALE_FACTOR_ENV).ok()?;
    let parsed = parse_scale_factor(&value);
    if parsed.is_none() {
        tracing::warn!(%value, "ignoring malformed {}", SCALE_FACTOR_ENV);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_clamps() {
        assert_eq!(parse_scale_factor("2"), Some(2.0));
        assert_eq!(parse_scale_factor(" 1.5 "), Some(1.5));
        assert_eq!(parse_scale_factor("0.5"), Some(1.0));
        assert_eq!(parse_scale_factor("big"), None);
        assert_eq!(parse_scale_factor("inf"), None);
    }
}
