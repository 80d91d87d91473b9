//! Human-readable number formatting for KPI display

const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a count compactly: `950`, `1.5K`, `2.35M`.
///
/// Values are rounded to two decimals with trailing zeros dropped. Counts
/// below one thousand are printed as-is.
pub fn compact_count(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }

    let value = n as f64;
    for (scale, suffix) in SCALES {
        let scaled = round2(value / scale);
        if scaled >= 1.0 {
            return format!("{scaled}{suffix}");
        }
    }
    n.to_string()
}
