//! Human-readable formatting for sizes, counts and durations
//!
//! Keeps file sizes, prediction counts and elapsed times displayed the same
//! way everywhere a presentation layer or the CLI shows them.

const KIB: u64 = 1024;
const GIB: u64 = KIB * KIB * KIB;

/// Size unit labels, 1024 base
const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with the largest unit that keeps the value >= 1
///
/// Values are rounded to two decimals with trailing zeros dropped. Units stop
/// at GB, so larger sizes are shown as a GB count.
///
/// # Examples
///
/// ```
/// use sfp_common::human_format::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(512), "512 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 && bytes >= divisor * KIB {
        divisor *= KIB;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Format a byte count as GiB with two decimals (`"1.50 GB"`)
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / GIB as f64)
}

/// Format elapsed seconds compactly
///
/// - under a minute: `45s`
/// - under an hour: `2m 34s`
/// - otherwise: `1h 02m`
///
/// # Examples
///
/// ```
/// use sfp_common::human_format::format_elapsed;
///
/// assert_eq!(format_elapsed(45), "45s");
/// assert_eq!(format_elapsed(154), "2m 34s");
/// assert_eq!(format_elapsed(3720), "1h 02m");
/// ```
pub fn format_elapsed(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Format an integer with comma thousands separators (`45,820`)
pub fn format_count(n: u64) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_size_units() {
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(GIB / 2), "512 MB");
        assert_eq!(format_file_size(2 * GIB), "2 GB");
    }

    #[test]
    fn test_file_size_caps_at_gb() {
        assert_eq!(format_file_size(2048 * GIB), "2048 GB");
    }

    #[test]
    fn test_file_size_rounds_two_decimals() {
        // 1.333... KB
        assert_eq!(format_file_size(1365), "1.33 KB");
    }

    #[test]
    fn test_gib_two_decimals() {
        assert_eq!(format_gib(GIB), "1.00 GB");
        assert_eq!(format_gib(GIB / 2), "0.50 GB");
        assert_eq!(format_gib(0), "0.00 GB");
    }

    #[test]
    fn test_elapsed_boundaries() {
        assert_eq!(format_elapsed(0), "0s");
        assert_eq!(format_elapsed(59), "59s");
        assert_eq!(format_elapsed(60), "1m 0s");
        assert_eq!(format_elapsed(3599), "59m 59s");
        assert_eq!(format_elapsed(3600), "1h 00m");
    }

    #[test]
    fn test_count_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(45_820), "45,820");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }
}
