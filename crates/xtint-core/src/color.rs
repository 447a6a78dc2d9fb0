#![forbid(unsafe_code)]

//! Computed-color parsing and dark-color classification.
//!
//! Only the `rgb(...)` / `rgba(...)` serializations that engines produce for
//! computed values are understood. Everything else (hex literals, named
//! colors, `transparent`) is "not a color we classify" and never counts as
//! dark.

/// Channel values parsed from a computed color string.
///
/// Channels are not clamped; `alpha` defaults to `1.0` when absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

/// Threshold set deciding whether a color is "dark enough to override".
///
/// A color matches when its alpha is at least `min_alpha` and every one of
/// red, green and blue is at most `max_channel`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarkPolicy {
    pub max_channel: f64,
    pub min_alpha: f64,
}

impl DarkPolicy {
    /// Background fills: near-black and mostly opaque.
    pub const BACKGROUND: Self = Self {
        max_channel: 26.0,
        min_alpha: 0.55,
    };

    /// Border strokes are thin, so a lighter and more transparent color
    /// still reads as dark.
    pub const BORDER: Self = Self {
        max_channel: 90.0,
        min_alpha: 0.35,
    };

    /// Whether `channels` falls inside this policy.
    #[must_use]
    pub fn matches(&self, channels: &Rgba) -> bool {
        if channels.alpha < self.min_alpha {
            return false;
        }
        channels.red <= self.max_channel
            && channels.green <= self.max_channel
            && channels.blue <= self.max_channel
    }

    /// Parse `text` and classify it. Unparsable input is never dark.
    #[must_use]
    pub fn classify(&self, text: &str) -> bool {
        parse_color(text).is_some_and(|channels| self.matches(&channels))
    }
}

fn is_css_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t' | '\u{c}')
}

/// Parse a computed `rgb(...)` or `rgba(...)` string.
///
/// Whitespace is stripped and case ignored. Numeric tokens are maximal runs
/// of digits and `.`; the first three are red, green and blue, an optional
/// fourth is alpha. Fewer than three tokens, or a malformed token in any of
/// those positions (`1.2.3`, a lone `.`), yields `None`.
#[must_use]
pub fn parse_color(text: &str) -> Option<Rgba> {
    let normalized: String = text
        .chars()
        .filter(|&ch| !is_css_whitespace(ch))
        .flat_map(char::to_lowercase)
        .collect();

    let functional = normalized.starts_with("rgb(") || normalized.starts_with("rgba(");
    if !functional || !normalized.ends_with(')') {
        return None;
    }

    let mut values = Vec::with_capacity(4);
    let mut token = String::new();
    for ch in normalized.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            token.push(ch);
            continue;
        }
        if !token.is_empty() {
            values.push(parse_token(&token));
            token.clear();
        }
    }
    if !token.is_empty() {
        values.push(parse_token(&token));
    }

    if values.len() < 3 {
        return None;
    }
    let alpha = values.get(3).copied().unwrap_or(1.0);
    let channels = Rgba {
        red: values[0],
        green: values[1],
        blue: values[2],
        alpha,
    };
    let finite = [channels.red, channels.green, channels.blue, channels.alpha]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        tracing::trace!(target: "xtint.color", input = text, "rejected non-finite channel");
        return None;
    }
    Some(channels)
}

fn parse_token(token: &str) -> f64 {
    token.parse::<f64>().unwrap_or(f64::NAN)
}

/// Whether a computed background color is near-black and opaque enough to
/// register visually.
#[must_use]
pub fn is_dark_background(text: &str) -> bool {
    DarkPolicy::BACKGROUND.classify(text)
}

/// Whether a computed border color is dark enough to need recoloring.
#[must_use]
pub fn is_dark_border(text: &str) -> bool {
    DarkPolicy::BORDER.classify(text)
}

/// Read a CSS length by its leading numeric prefix (`"1.5px"` -> `1.5`).
///
/// Anything without a numeric prefix reads as `0.0`.
#[must_use]
pub fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
