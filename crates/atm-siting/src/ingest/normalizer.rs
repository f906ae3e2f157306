//! Value and key normalization shared by every layer.

/// Lowercase, trimmed lookup key used for exact commune matches.
///
/// Byte-order marks and zero-width spaces left over from spreadsheet exports are
/// stripped and inner whitespace runs collapse to a single space, so
/// `"\u{feff}Dar  Bouazza "` and `"dar bouazza"` share a key.
pub fn normalize_key(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

/// Rescale a raw indicator into `[0, 1]`.
///
/// Values above 1 are read as percentages. Missing or non-finite input carries
/// no signal and maps to `0.0`.
pub fn to_unit(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => unit_interval(v),
        _ => 0.0,
    }
}

pub(crate) fn unit_interval(value: f64) -> f64 {
    if value < 0.0 {
        0.0
    } else if value <= 1.0 {
        value
    } else {
        (value / 100.0).min(1.0)
    }
}

/// Cell contents that stand for "no value" in upstream exports.
pub(crate) fn is_absent_marker(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan") || value == "None"
}

/// Trim a cell and drop absent markers.
pub(crate) fn clean_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_absent_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a numeric cell. A lone decimal comma is accepted (`"33,6"`).
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_absent_marker(trimmed) {
        return None;
    }

    let parsed = match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) if !trimmed.contains('.') && trimmed.matches(',').count() == 1 => {
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };

    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_unit_handles_both_scales() {
        assert_eq!(to_unit(Some(50.0)), 0.5);
        assert_eq!(to_unit(Some(0.5)), 0.5);
        assert_eq!(to_unit(Some(150.0)), 1.0);
        assert_eq!(to_unit(Some(-5.0)), 0.0);
        assert_eq!(to_unit(Some(1.0)), 1.0);
        assert_eq!(to_unit(Some(0.0)), 0.0);
        assert_eq!(to_unit(None), 0.0);
        assert_eq!(to_unit(Some(f64::NAN)), 0.0);
        assert_eq!(to_unit(Some(f64::INFINITY)), 0.0);
    }

    #[test]
    fn to_unit_stays_in_range_across_a_sweep() {
        let mut value = -250.0;
        while value <= 250.0 {
            let unit = to_unit(Some(value));
            assert!((0.0..=1.0).contains(&unit), "{value} -> {unit}");
            value += 0.75;
        }
    }

    #[test]
    fn normalize_key_collapses_whitespace_and_case() {
        assert_eq!(normalize_key("\u{feff}Dar  Bouazza "), "dar bouazza");
        assert_eq!(normalize_key("  Aïn   Chock"), "aïn chock");
    }

    #[test]
    fn absent_markers_are_not_text() {
        assert_eq!(clean_text("  nan "), None);
        assert_eq!(clean_text("NaN"), None);
        assert_eq!(clean_text("None"), None);
        assert_eq!(clean_text("   "), None);
        assert_eq!(clean_text(" Anfa "), Some("Anfa".to_string()));
    }

    #[test]
    fn parse_number_accepts_decimal_comma() {
        assert_eq!(parse_number("33,6"), Some(33.6));
        assert_eq!(parse_number(" -7.8 "), Some(-7.8));
        assert_eq!(parse_number("1,234.5"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }
}
