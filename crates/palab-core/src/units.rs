//! Human-readable byte sizes for log lines and CLI output.

const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Formats a byte count using binary multiples: `512 B`, `1.5 KB`, `2.0 GB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Converts a megabyte limit from config into bytes.
pub fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_in_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
    }

    #[test]
    fn scales_to_larger_units() {
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn largest_unit_does_not_overflow_table() {
        assert!(format_bytes(u64::MAX).ends_with(" PB"));
    }

    #[test]
    fn mb_conversion_saturates() {
        assert_eq!(mb_to_bytes(2), 2 * 1024 * 1024);
        assert_eq!(mb_to_bytes(u64::MAX), u64::MAX);
    }
}
