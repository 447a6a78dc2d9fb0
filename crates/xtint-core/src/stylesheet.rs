#![forbid(unsafe_code)]

//! Generated stylesheet for the host page's known structural regions.
//!
//! The selector catalogs below are the only place that knows the target
//! page's markup. Every rule is `!important` so it wins over the page's own
//! specificity.

use core::fmt::Write as _;

use crate::theme::Theme;

/// Page chrome, navigation, dialogs, list cells and content cards.
pub const BACKGROUND_SELECTORS: &[&str] = &[
    "html",
    "body",
    "#react-root",
    "main[role='main']",
    "header[role='banner']",
    "[role='navigation']",
    "[data-testid='TopNavBar']",
    "[data-testid='primaryColumn']",
    "[data-testid='sidebarColumn']",
    "[data-testid='DMDrawer']",
    "[data-testid='cellInnerDiv']",
    "[data-testid='tweet']",
    "[data-testid='sheetDialog']",
    "[role='dialog']",
    "[role='menu']",
    "[role='listbox']",
];

/// Generic text-bearing, heading and list selectors.
pub const TEXT_SELECTORS: &[&str] = &[
    "body",
    "main",
    "header",
    "nav",
    "section",
    "article",
    "aside",
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "ul",
    "ol",
    "[data-testid='tweetText']",
];

/// Interactive actions. Rules also cover every descendant so inline icon
/// and label colors lose.
pub const ACTION_TEXT_SELECTORS: &[&str] = &[
    "[data-testid='reply']",
    "[data-testid='retweet']",
    "[data-testid='like']",
    "[data-testid='bookmark']",
    "a[href*='/analytics']",
    "[aria-label='Share post']",
    "[aria-label='Share']",
];

/// Containers and form controls whose borders follow the theme.
pub const BORDER_SELECTORS: &[&str] = &[
    "main[role='main']",
    "header[role='banner']",
    "[role='navigation']",
    "[data-testid='TopNavBar']",
    "[data-testid='primaryColumn']",
    "[data-testid='sidebarColumn']",
    "[data-testid='DMDrawer']",
    "[data-testid='cellInnerDiv']",
    "[data-testid='tweet']",
    "[role='dialog']",
    "[role='menu']",
    "[role='listbox']",
    "article",
    "section",
    "aside",
    "button",
    "input",
    "textarea",
    "select",
    "hr",
];

/// Build the full stylesheet text for `theme`.
///
/// Four rule groups in order: backgrounds, text, action text, borders. One
/// rule per line, trailing newline.
#[must_use]
pub fn build_css(theme: &Theme) -> String {
    let mut css = String::with_capacity(4096);

    for selector in BACKGROUND_SELECTORS {
        let _ = writeln!(
            css,
            "{selector} {{ background-color: {} !important; }}",
            theme.background
        );
    }
    for selector in TEXT_SELECTORS {
        let _ = writeln!(css, "{selector} {{ color: {} !important; }}", theme.text);
    }
    for selector in ACTION_TEXT_SELECTORS {
        let _ = writeln!(
            css,
            "{selector}, {selector} * {{ color: {} !important; }}",
            theme.text
        );
    }
    for selector in BORDER_SELECTORS {
        let _ = writeln!(
            css,
            "{selector} {{ border-color: {} !important; }}",
            theme.border
        );
    }

    css
}
