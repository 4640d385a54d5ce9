//! Condition code to background icon mapping.
//!
//! Codes follow the OpenWeatherMap condition table the companion app
//! forwards. See: https://openweathermap.org/weather-conditions

use crate::types::IconId;

/// Inclusive range of condition codes sharing one background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionRange {
    pub start: i32,
    pub end: i32,
    pub icon: IconId,
}

impl ConditionRange {
    pub const fn new(start: i32, end: i32, icon: IconId) -> Self {
        Self { start, end, icon }
    }

    pub const fn single(code: i32, icon: IconId) -> Self {
        Self::new(code, code, icon)
    }

    pub fn contains(&self, code: i32) -> bool {
        (self.start..=self.end).contains(&code)
    }

    fn overlaps(&self, other: &ConditionRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Checked in order; the first matching range wins.
///
/// 761 (dust) belongs to the fog band. Only 781 (tornado) maps to the
/// thunderstorm art, which keeps every range disjoint.
pub const CONDITION_RANGES: &[ConditionRange] = &[
    ConditionRange::new(200, 232, IconId::Storm),
    ConditionRange::new(300, 321, IconId::Drizzle),
    ConditionRange::new(500, 504, IconId::Rain),
    ConditionRange::single(511, IconId::Snow),
    ConditionRange::new(520, 531, IconId::Rain),
    ConditionRange::new(600, 622, IconId::Snow),
    ConditionRange::new(701, 761, IconId::Fog),
    ConditionRange::single(781, IconId::Thunderstorm),
    ConditionRange::single(800, IconId::Clear),
    ConditionRange::single(801, IconId::MostlyClear),
    ConditionRange::new(802, 804, IconId::Cloudy),
];

/// Range table errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("Range {start}..={end} is inverted")]
    Inverted { start: i32, end: i32 },
    #[error("Ranges {first:?} and {second:?} overlap")]
    Overlap {
        first: (i32, i32),
        second: (i32, i32),
    },
}

/// Check that every range is well formed and no two ranges share a code.
pub fn validate_ranges(ranges: &[ConditionRange]) -> Result<(), RangeError> {
    for range in ranges {
        if range.start > range.end {
            return Err(RangeError::Inverted {
                start: range.start,
                end: range.end,
            });
        }
    }

    for (i, a) in ranges.iter().enumerate() {
        for b in &ranges[i + 1..] {
            if a.overlaps(b) {
                return Err(RangeError::Overlap {
                    first: (a.start, a.end),
                    second: (b.start, b.end),
                });
            }
        }
    }

    Ok(())
}

/// Resolve a condition code against an arbitrary range table.
///
/// Non-positive codes never match. `None` means "keep the current icon".
pub fn resolve_in(ranges: &[ConditionRange], code: i32) -> Option<IconId> {
    if code <= 0 {
        return None;
    }
    ranges
        .iter()
        .find(|range| range.contains(code))
        .map(|range| range.icon)
}

/// Resolve a condition code to its background icon.
pub fn resolve_icon(code: i32) -> Option<IconId> {
    resolve_in(CONDITION_RANGES, code)
}

/// Human label for a condition code, drawn next to the temperatures.
pub fn condition_label(code: i32) -> &'static str {
    resolve_icon(code).map_or("Unknown", |icon| icon.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_disjoint() {
        assert_eq!(validate_ranges(CONDITION_RANGES), Ok(()));
    }

    #[test]
    fn test_non_positive_codes_are_no_change() {
        assert_eq!(resolve_icon(0), None);
        assert_eq!(resolve_icon(-5), None);
        assert_eq!(resolve_icon(i32::MIN), None);
    }

    #[test]
    fn test_storm_band_edges() {
        assert_eq!(resolve_icon(199), None);
        assert_eq!(resolve_icon(200), Some(IconId::Storm));
        assert_eq!(resolve_icon(232), Some(IconId::Storm));
        assert_eq!(resolve_icon(233), None);
    }

    #[test]
    fn test_clear_sky_codes() {
        assert_eq!(resolve_icon(800), Some(IconId::Clear));
        assert_eq!(resolve_icon(801), Some(IconId::MostlyClear));
        assert_eq!(resolve_icon(802), Some(IconId::Cloudy));
        assert_eq!(resolve_icon(804), Some(IconId::Cloudy));
        assert_eq!(resolve_icon(805), None);
    }

    #[test]
    fn test_precipitation_codes() {
        assert_eq!(resolve_icon(300), Some(IconId::Drizzle));
        assert_eq!(resolve_icon(321), Some(IconId::Drizzle));
        assert_eq!(resolve_icon(500), Some(IconId::Rain));
        assert_eq!(resolve_icon(505), None);
        assert_eq!(resolve_icon(511), Some(IconId::Snow));
        assert_eq!(resolve_icon(520), Some(IconId::Rain));
        assert_eq!(resolve_icon(531), Some(IconId::Rain));
        assert_eq!(resolve_icon(600), Some(IconId::Snow));
        assert_eq!(resolve_icon(622), Some(IconId::Snow));
    }

    #[test]
    fn test_atmosphere_codes() {
        assert_eq!(resolve_icon(701), Some(IconId::Fog));
        assert_eq!(resolve_icon(761), Some(IconId::Fog));
        assert_eq!(resolve_icon(771), None);
        assert_eq!(resolve_icon(781), Some(IconId::Thunderstorm));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for code in -10..1000 {
            assert_eq!(resolve_icon(code), resolve_icon(code));
        }
    }

    #[test]
    fn test_at_most_one_range_claims_each_code() {
        for code in 0..1000 {
            let claims = CONDITION_RANGES.iter().filter(|r| r.contains(code)).count();
            assert!(claims <= 1, "code {code} claimed by {claims} ranges");
        }
    }

    #[test]
    fn test_overlap_is_reported() {
        let ranges = [
            ConditionRange::new(701, 761, IconId::Fog),
            ConditionRange::new(761, 761, IconId::Thunderstorm),
        ];
        assert_eq!(
            validate_ranges(&ranges),
            Err(RangeError::Overlap {
                first: (701, 761),
                second: (761, 761),
            })
        );
    }

    #[test]
    fn test_overlapping_table_still_resolves_first_match() {
        let ranges = [
            ConditionRange::new(701, 761, IconId::Fog),
            ConditionRange::new(761, 781, IconId::Thunderstorm),
        ];
        assert_eq!(resolve_in(&ranges, 761), Some(IconId::Fog));
        assert_eq!(resolve_in(&ranges, 762), Some(IconId::Thunderstorm));
    }

    #[test]
    fn test_inverted_range_is_reported() {
        let ranges = [ConditionRange::new(10, 5, IconId::Clear)];
        assert_eq!(
            validate_ranges(&ranges),
            Err(RangeError::Inverted { start: 10, end: 5 })
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(condition_label(500), "Rain");
        assert_eq!(condition_label(800), "Clear");
        assert_eq!(condition_label(233), "Unknown");
        assert_eq!(condition_label(0), "Unknown");
    }
}
