use serde::{Deserialize, Serialize};

/// Today's weather as relayed by the companion phone.
///
/// Temperatures and the date arrive preformatted for the phone's locale and
/// are passed through untouched. A snapshot is always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub date: String,
    pub condition_code: i32,
    pub high: String,
    pub low: String,
}

impl WeatherSnapshot {
    pub fn new(
        date: impl Into<String>,
        condition_code: i32,
        high: impl Into<String>,
        low: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            condition_code,
            high: high.into(),
            low: low.into(),
        }
    }
}

/// Background artwork identifiers, one per condition bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconId {
    Clear,
    MostlyClear,
    Cloudy,
    Drizzle,
    Fog,
    Rain,
    Snow,
    Storm,
    Thunderstorm,
}

impl IconId {
    pub const ALL: [IconId; 9] = [
        IconId::Clear,
        IconId::MostlyClear,
        IconId::Cloudy,
        IconId::Drizzle,
        IconId::Fog,
        IconId::Rain,
        IconId::Snow,
        IconId::Storm,
        IconId::Thunderstorm,
    ];

    /// Resource name of the background image for this icon
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Clear => "img_clear",
            Self::MostlyClear => "img_mostly_clear",
            Self::Cloudy => "img_cloudy",
            Self::Drizzle => "img_drizzle",
            Self::Fog => "img_fog",
            Self::Rain => "img_rain",
            Self::Snow => "img_snow",
            Self::Storm => "img_storm",
            Self::Thunderstorm => "img_thunderstorm",
        }
    }

    /// Short text drawn after the low temperature
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MostlyClear => "Mostly Clear",
            Self::Cloudy => "Cloudy",
            Self::Drizzle => "Drizzle",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Storm => "Storm",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.resource_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names_are_unique() {
        let mut names: Vec<_> = IconId::ALL.iter().map(IconId::resource_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), IconId::ALL.len());
    }

    #[test]
    fn test_snapshot_new_keeps_strings_verbatim() {
        let snapshot = WeatherSnapshot::new("Mon Jun 1", 500, "72°", "58°");
        assert_eq!(snapshot.date, "Mon Jun 1");
        assert_eq!(snapshot.condition_code, 500);
        assert_eq!(snapshot.high, "72°");
        assert_eq!(snapshot.low, "58°");
    }
}
