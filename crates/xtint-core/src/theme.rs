#![forbid(unsafe_code)]

//! Validated theme colors.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A lower-case `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColor(String);

impl HexColor {
    /// Accept exactly `#` followed by six hex digits (any case).
    #[must_use]
    pub fn parse(candidate: &str) -> Option<Self> {
        let bytes = candidate.as_bytes();
        if bytes.len() != 7 || bytes[0] != b'#' {
            return None;
        }
        if !bytes[1..].iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        Some(Self(candidate.to_ascii_lowercase()))
    }

    /// Build from a literal known to be valid. Used for built-in palettes.
    pub(crate) fn from_static(literal: &'static str) -> Self {
        debug_assert!(Self::parse(literal).is_some(), "invalid built-in color {literal}");
        Self(literal.to_ascii_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("expected #rrggbb color, got {raw:?}")))
    }
}

/// `candidate` lower-cased when it is a well-formed `#rrggbb` color,
/// otherwise `fallback` unchanged.
#[must_use]
pub fn normalize_color(candidate: &str, fallback: &HexColor) -> HexColor {
    HexColor::parse(candidate).unwrap_or_else(|| fallback.clone())
}

/// Same as [`normalize_color`] for an untyped stored value. Anything that is
/// not a string, or is absent, falls back.
#[must_use]
pub fn normalize_value(candidate: Option<&serde_json::Value>, fallback: &HexColor) -> HexColor {
    match candidate.and_then(serde_json::Value::as_str) {
        Some(text) => normalize_color(text, fallback),
        None => fallback.clone(),
    }
}

/// One of the three themed roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeField {
    Background,
    Text,
    Border,
}

impl ThemeField {
    pub const ALL: [Self; 3] = [Self::Background, Self::Text, Self::Border];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Text => "text",
            Self::Border => "border",
        }
    }

    /// Inverse of [`ThemeField::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// The three colors currently enforced on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Theme {
    pub background: HexColor,
    pub text: HexColor,
    pub border: HexColor,
}

impl Theme {
    /// The built-in "Dim" palette.
    #[must_use]
    pub fn dim() -> Self {
        Self {
            background: HexColor::from_static("#15202b"),
            text: HexColor::from_static("#e7e9ea"),
            border: HexColor::from_static("#38444d"),
        }
    }

    #[must_use]
    pub fn get(&self, field: ThemeField) -> &HexColor {
        match field {
            ThemeField::Background => &self.background,
            ThemeField::Text => &self.text,
            ThemeField::Border => &self.border,
        }
    }

    pub fn set(&mut self, field: ThemeField, color: HexColor) {
        match field {
            ThemeField::Background => self.background = color,
            ThemeField::Text => self.text = color,
            ThemeField::Border => self.border = color,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_and_lowercases_hex() {
        let fallback = Theme::dim().text;
        assert_eq!(normalize_color("#ABC123", &fallback).as_str(), "#abc123");
        assert_eq!(normalize_color("#ffffff", &fallback).as_str(), "#ffffff");
    }

    #[test]
    fn rejects_malformed_hex() {
        let fallback = Theme::dim().text;
        for bad in ["BADCOLOR", "#fff", "#fffffff", "ffffff0", "#gggggg", "", "#12345 "] {
            assert_eq!(normalize_color(bad, &fallback), fallback, "{bad}");
        }
    }

    #[test]
    fn non_string_values_fall_back() {
        let fallback = Theme::dim().border;
        assert_eq!(normalize_value(Some(&json!(42)), &fallback), fallback);
        assert_eq!(normalize_value(Some(&json!(null)), &fallback), fallback);
        assert_eq!(normalize_value(None, &fallback), fallback);
        assert_eq!(
            normalize_value(Some(&json!("#00FF00")), &fallback).as_str(),
            "#00ff00"
        );
    }

    #[test]
    fn dim_palette_values() {
        let dim = Theme::dim();
        assert_eq!(dim.background.as_str(), "#15202b");
        assert_eq!(dim.text.as_str(), "#e7e9ea");
        assert_eq!(dim.border.as_str(), "#38444d");
    }

    #[test]
    fn deserialize_rejects_bad_hex() {
        let err = serde_json::from_value::<HexColor>(json!("red")).unwrap_err();
        assert!(err.to_string().contains("#rrggbb"));
        let ok: HexColor = serde_json::from_value(json!("#AABBCC")).unwrap();
        assert_eq!(ok.as_str(), "#aabbcc");
    }

    #[test]
    fn set_and_get_by_field() {
        let mut theme = Theme::dim();
        let red = HexColor::parse("#ff0000").unwrap();
        theme.set(ThemeField::Border, red.clone());
        assert_eq!(theme.get(ThemeField::Border), &red);
        assert_eq!(theme.get(ThemeField::Text), &Theme::dim().text);
    }

    #[test]
    fn field_names_round_trip() {
        for field in ThemeField::ALL {
            assert_eq!(ThemeField::from_name(field.name()), Some(field));
        }
        assert_eq!(ThemeField::from_name("bgColor"), None);
    }
}
