//! Formatting helpers shared by the report payloads and the CLI.

/// Group digits in thousands, e.g. `12345` -> `12,345`.
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Round to one decimal place and drop a trailing `.0`, e.g. `66.666` -> `66.7`.
pub fn format_one_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{}", rounded)
}

/// A percentage with one decimal, e.g. `12.5%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_one_decimal(value))
}

/// Human-readable duration, e.g. `45s`, `3m 20s`, `1h 05m`.
pub fn format_duration_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as i64;
    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{}h {:02}m", total / 3600, (total % 3600) / 60)
    }
}

/// Milliseconds with no decimals, or a dash when unknown.
pub fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{:.0}ms", ms),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(200.0 / 3.0), "66.7%");
        assert_eq!(format_percent(100.0), "100%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_secs(0.0), "0s");
        assert_eq!(format_duration_secs(45.4), "45s");
        assert_eq!(format_duration_secs(200.0), "3m 20s");
        assert_eq!(format_duration_secs(3900.0), "1h 05m");
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(Some(312.6)), "313ms");
        assert_eq!(format_ms(None), "-");
    }
}
