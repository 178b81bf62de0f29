/// Two-decimal value followed by its unit, e.g. `1292.74 Cr`
pub fn format_value(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{:.2}", value)
    } else {
        format!("{:.2} {}", value, unit)
    }
}

/// Fraction rendered as a whole-or-decimal percentage, e.g. `0.105` -> `10.5%`
pub fn format_rate(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{:.0}%", pct)
    } else {
        format!("{:.1}%", pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1292.7412, "Cr"), "1292.74 Cr");
        assert_eq!(format_value(52.0, "₹/share"), "52.00 ₹/share");
        assert_eq!(format_value(-3.456, ""), "-3.46");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.10), "10%");
        assert_eq!(format_rate(0.03), "3%");
        assert_eq!(format_rate(0.105), "10.5%");
    }
}
