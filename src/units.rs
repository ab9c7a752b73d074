// src/units.rs
//! Unit canonicalization: maps free-text unit strings to one comparison token.
//! No conversion happens here; "mcg" and "µg" become the same token, nothing more.

/// Canonical token for a free-text unit, or `None` for empty/absent input.
///
/// Trims, lowercases, folds Unicode micro-sign variants to `u`, then applies
/// a fixed alias table. Total function: never errors.
pub fn canonicalize_unit(raw: Option<&str>) -> Option<String> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    // µ (micro sign) and μ (Greek mu) both show up in source data.
    let lowered = s.to_lowercase().replace(['\u{00B5}', '\u{03BC}'], "u");

    let canon = match lowered.as_str() {
        "mcg" => "ug",
        "gram" | "grams" => "g",
        "milligram" | "milligrams" => "mg",
        "kcalorie" | "kcalories" => "kcal",
        other => other,
    };
    Some(canon.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn micro_variants_collapse_to_ug() {
        assert_eq!(canonicalize_unit(Some("µg")).as_deref(), Some("ug"));
        assert_eq!(canonicalize_unit(Some("μg")).as_deref(), Some("ug"));
        assert_eq!(canonicalize_unit(Some("mcg")).as_deref(), Some("ug"));
        assert_eq!(canonicalize_unit(Some(" MCG ")).as_deref(), Some("ug"));
    }

    #[test]
    fn alias_table_applies() {
        assert_eq!(canonicalize_unit(Some("Grams")).as_deref(), Some("g"));
        assert_eq!(canonicalize_unit(Some("milligram")).as_deref(), Some("mg"));
        assert_eq!(canonicalize_unit(Some("kcalories")).as_deref(), Some("kcal"));
    }

    #[test]
    fn unknown_units_pass_through_lowercased() {
        assert_eq!(canonicalize_unit(Some("ML")).as_deref(), Some("ml"));
    }

    #[test]
    fn empty_and_none_yield_none() {
        assert_eq!(canonicalize_unit(None), None);
        assert_eq!(canonicalize_unit(Some("")), None);
        assert_eq!(canonicalize_unit(Some("   ")), None);
    }
}
