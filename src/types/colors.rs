use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text and background colors as Notion names them.
///
/// Serialized with the upstream names so cached trees stay readable next to
/// API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    GrayBackground,
    BrownBackground,
    RedBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
}

const NAMES: [(Color, &str); 19] = [
    (Color::Default, "default"),
    (Color::Gray, "gray"),
    (Color::Brown, "brown"),
    (Color::Red, "red"),
    (Color::Orange, "orange"),
    (Color::Yellow, "yellow"),
    (Color::Green, "green"),
    (Color::Blue, "blue"),
    (Color::Purple, "purple"),
    (Color::Pink, "pink"),
    (Color::GrayBackground, "gray_background"),
    (Color::BrownBackground, "brown_background"),
    (Color::RedBackground, "red_background"),
    (Color::OrangeBackground, "orange_background"),
    (Color::YellowBackground, "yellow_background"),
    (Color::GreenBackground, "green_background"),
    (Color::BlueBackground, "blue_background"),
    (Color::PurpleBackground, "purple_background"),
    (Color::PinkBackground, "pink_background"),
];

impl std::str::FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(color, _)| *color)
            .ok_or_else(|| ValidationError::InvalidColor(s.to_string()))
    }
}

impl Color {
    /// Unknown or missing names become `Default` rather than failing the
    /// node they sit on.
    pub fn from_api(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(color, _)| color == self)
            .map_or("default", |(_, name)| *name)
    }

    pub fn is_background(&self) -> bool {
        self.as_str().ends_with("_background")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_parse() {
        for (color, name) in NAMES {
            assert_eq!(name.parse::<Color>().ok(), Some(color));
            assert_eq!(color.to_string(), name);
        }
        assert!("teal".parse::<Color>().is_err());
    }

    #[test]
    fn upstream_names_are_lenient() {
        assert_eq!(Color::from_api(Some("teal")), Color::Default);
        assert_eq!(Color::from_api(None), Color::Default);
        assert_eq!(Color::from_api(Some("pink")), Color::Pink);
        assert!(Color::from_api(Some("red_background")).is_background());
    }

    #[test]
    fn serde_uses_notion_names() {
        let json = serde_json::to_string(&Color::BlueBackground).unwrap();
        assert_eq!(json, "\"blue_background\"");
    }
}
