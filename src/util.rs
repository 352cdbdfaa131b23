use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn format_size(size: f32) -> String {
    const UNITS: [&str; 4] = ["", "k", "M", "G"];

    if !size.is_finite() {
        return "-".to_owned();
    }

    let mut value = size.abs() as f64;
    let mut unit = 0usize;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    let sign = if size < 0.0 { "-" } else { "" };
    if unit == 0 {
        if value.fract().abs() < f64::EPSILON {
            format!("{sign}{value:.0}")
        } else {
            format!("{sign}{value:.2}")
        }
    } else {
        format!("{sign}{value:.1}{}", UNITS[unit])
    }
}

pub fn short_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut shortened = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}

/// Deterministic pair in `[-1, 1]²` derived from `id`.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_uses_compact_units() {
        assert_eq!(format_size(12.0), "12");
        assert_eq!(format_size(1_500.0), "1.5k");
        assert_eq!(format_size(2_000_000.0), "2.0M");
        assert_eq!(format_size(f32::NAN), "-");
    }

    #[test]
    fn short_label_truncates_with_ellipsis() {
        assert_eq!(short_label("bubble", 10), "bubble");
        assert_eq!(short_label("a very long label", 6), "a ver…");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let first = stable_pair("node-a");
        assert_eq!(first, stable_pair("node-a"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
