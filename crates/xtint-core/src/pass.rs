#![forbid(unsafe_code)]

//! Inline override pass.
//!
//! Walks a subtree and forces inline `background-color` / `border-color`
//! on elements whose *computed* colors classify as dark. Stylesheet rules
//! cannot win against colors the page sets inline at render time, so this
//! pass patches them element by element.

use core::ops::AddAssign;

use xtint_backend::{ComputedStyle, ComputedStyleReader, StyleMutator};

use crate::color::{is_dark_background, is_dark_border, leading_number};
use crate::theme::Theme;

/// Tags never themed: media and vector primitives.
pub const SKIPPED_TAGS: &[&str] = &["IMG", "VIDEO", "CANVAS", "SVG", "PATH", "SOURCE"];

/// Counters for one pass (or several, summed).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OverrideStats {
    /// HTML elements inspected, including skipped ones.
    pub visited: usize,
    /// Elements excluded by tag or because they are being edited.
    pub skipped: usize,
    pub backgrounds: usize,
    pub borders: usize,
    /// Inline writes the host rejected.
    pub failed_writes: usize,
}

impl AddAssign for OverrideStats {
    fn add_assign(&mut self, rhs: Self) {
        self.visited += rhs.visited;
        self.skipped += rhs.skipped;
        self.backgrounds += rhs.backgrounds;
        self.borders += rhs.borders;
        self.failed_writes += rhs.failed_writes;
    }
}

/// A background image marks the dark fill as intentional.
#[must_use]
pub fn has_background_image(style: &ComputedStyle) -> bool {
    !style.background_image.is_empty() && style.background_image != "none"
}

#[must_use]
pub fn needs_background_override(style: &ComputedStyle) -> bool {
    is_dark_background(&style.background_color) && !has_background_image(style)
}

#[must_use]
pub fn has_visible_border(style: &ComputedStyle) -> bool {
    style.border_width.iter().any(|w| leading_number(w) > 0.0)
}

/// One dark side is enough; all four sides are then recolored together.
#[must_use]
pub fn needs_border_override(style: &ComputedStyle) -> bool {
    has_visible_border(style) && style.border_color.iter().any(|c| is_dark_border(c))
}

fn is_skipped<D: ComputedStyleReader>(doc: &D, element: &D::Element) -> bool {
    let tag = doc.tag_name(element);
    if SKIPPED_TAGS.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
        return true;
    }
    doc.is_content_editable(element)
}

/// Apply overrides to `root` and every descendant, in document order.
///
/// Non-HTML roots are ignored. Host write failures are logged and counted;
/// the pass continues with the next element.
pub fn apply_overrides<D>(doc: &mut D, root: &D::Element, theme: &Theme) -> OverrideStats
where
    D: ComputedStyleReader + StyleMutator,
{
    let mut stats = OverrideStats::default();
    if !doc.is_html_element(root) {
        return stats;
    }
    override_element(doc, root, theme, &mut stats);
    for element in doc.descendants(root) {
        override_element(doc, &element, theme, &mut stats);
    }
    stats
}

fn override_element<D>(doc: &mut D, element: &D::Element, theme: &Theme, stats: &mut OverrideStats)
where
    D: ComputedStyleReader + StyleMutator,
{
    if !doc.is_html_element(element) {
        return;
    }
    stats.visited += 1;
    if is_skipped(doc, element) {
        stats.skipped += 1;
        return;
    }
    let Some(style) = doc.computed_style(element) else {
        return;
    };

    if needs_background_override(&style) {
        match doc.set_important_property(element, "background-color", theme.background.as_str()) {
            Ok(()) => stats.backgrounds += 1,
            Err(err) => {
                stats.failed_writes += 1;
                tracing::warn!(target: "xtint.pass", ?element, %err, "background override rejected");
            }
        }
    }

    if needs_border_override(&style) {
        match doc.set_important_property(element, "border-color", theme.border.as_str()) {
            Ok(()) => stats.borders += 1,
            Err(err) => {
                stats.failed_writes += 1;
                tracing::warn!(target: "xtint.pass", ?element, %err, "border override rejected");
            }
        }
    }
}
