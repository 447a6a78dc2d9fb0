#![forbid(unsafe_code)]
#![doc = "Host capability traits for xtint: the boundary between the theming core and a live page."]
#![doc = ""]
#![doc = "The core never touches a rendering engine directly. Everything it needs from"]
#![doc = "the page (element walks, computed style, inline style writes, frame callbacks,"]
#![doc = "subtree observation, persisted configuration) flows through these traits."]
#![doc = "`xtint-web` binds them to `web-sys`; `xtint-harness` binds them to an"]
#![doc = "in-memory page for deterministic tests."]

use core::fmt::{Debug, Display};
use core::hash::Hash;

/// Persisted configuration values, keyed by storage key.
///
/// Values are arbitrary JSON; the core validates them on read.
pub type StoredValues = serde_json::Map<String, serde_json::Value>;

/// Changed keys delivered with one change notification.
pub type StorageChanges = std::collections::BTreeMap<String, StorageChange>;

// ---------------------------------------------------------------------------
// Computed style
// ---------------------------------------------------------------------------

/// Per-side values of a box property, in CSS order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderSides<T> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T> BorderSides<T> {
    /// Same value on all four sides.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            top: value.clone(),
            right: value.clone(),
            bottom: value.clone(),
            left: value,
        }
    }

    /// Iterate top, right, bottom, left.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.top, &self.right, &self.bottom, &self.left].into_iter()
    }
}

/// Snapshot of the computed (post-cascade, post-render) properties the
/// override pass inspects. All values are the engine's serialized strings,
/// e.g. `rgb(21, 32, 43)` or `1px`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    pub background_color: String,
    pub background_image: String,
    pub border_width: BorderSides<String>,
    pub border_color: BorderSides<String>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            background_color: "rgba(0, 0, 0, 0)".to_owned(),
            background_image: "none".to_owned(),
            border_width: BorderSides::uniform("0px".to_owned()),
            border_color: BorderSides::uniform("rgb(0, 0, 0)".to_owned()),
        }
    }
}

// ---------------------------------------------------------------------------
// Document capabilities
// ---------------------------------------------------------------------------

/// Read access to the element tree.
pub trait ElementTree {
    /// Element handle. Equality is element identity.
    type Element: Clone + Eq + Hash + Debug;

    /// Whether the node is an HTML element (as opposed to SVG/MathML).
    fn is_html_element(&self, element: &Self::Element) -> bool;

    /// Tag name as the engine reports it (upper-case for HTML).
    fn tag_name(&self, element: &Self::Element) -> String;

    /// Whether the user can currently edit the element's content in place.
    fn is_content_editable(&self, element: &Self::Element) -> bool;

    /// Every descendant element of `root`, in document order, excluding `root`.
    ///
    /// The returned list is a static snapshot.
    fn descendants(&self, root: &Self::Element) -> Vec<Self::Element>;

    /// First element matching a CSS selector, if any.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    /// The document body, if it exists yet.
    fn body(&self) -> Option<Self::Element>;
}

/// Live computed-style lookup.
pub trait ComputedStyleReader: ElementTree {
    /// Computed style of an element, or `None` if the engine cannot
    /// produce one (detached node, missing view).
    fn computed_style(&self, element: &Self::Element) -> Option<ComputedStyle>;
}

/// Write access to inline styles and the injected stylesheet.
pub trait StyleMutator: ElementTree {
    /// Platform-specific error type.
    type Error: Debug + Display;

    /// Set an inline property with `!important` priority.
    fn set_important_property(
        &mut self,
        element: &Self::Element,
        property: &str,
        value: &str,
    ) -> Result<(), Self::Error>;

    /// Create the style element identified by `id` if it does not exist yet
    /// (in the head, or the root element when there is no head), then
    /// replace its text with `css`.
    fn install_stylesheet(&mut self, id: &str, css: &str) -> Result<(), Self::Error>;
}

/// "Call me back at the next paint opportunity."
///
/// The host must eventually deliver exactly one flush per request.
pub trait FrameRequester {
    fn request_frame(&mut self);
}

/// Subtree observation for child-list changes.
pub trait MutationSource: ElementTree {
    /// Handle for one active observation.
    type Observation;

    /// Start observing child-list mutations anywhere under `root`.
    fn observe_subtree(&mut self, root: &Self::Element) -> Self::Observation;

    /// Stop a previously started observation.
    fn disconnect(&mut self, observation: Self::Observation);
}

/// Everything the theme controller needs from a page.
pub trait Page: ComputedStyleReader + StyleMutator + FrameRequester + MutationSource {}

impl<T> Page for T where T: ComputedStyleReader + StyleMutator + FrameRequester + MutationSource {}

// ---------------------------------------------------------------------------
// Mutation records
// ---------------------------------------------------------------------------

/// Kind of DOM mutation reported by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// A node inserted by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddedNode<E> {
    Element(E),
    /// Text, comment or any other non-element node.
    Other,
}

/// One observed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<E> {
    pub kind: MutationKind,
    pub added_nodes: Vec<AddedNode<E>>,
}

impl<E> MutationRecord<E> {
    /// A child-list record adding the given elements.
    pub fn child_list(elements: impl IntoIterator<Item = E>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added_nodes: elements.into_iter().map(AddedNode::Element).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration store
// ---------------------------------------------------------------------------

/// Storage failure reported by a [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store API is missing or could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The store reported an error for this operation.
    #[error("storage operation failed: {0}")]
    Failed(String),
}

/// Storage area a change notification originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageArea {
    Sync,
    Local,
    Managed,
    Session,
    Other(String),
}

impl StorageArea {
    /// Parse the area name a browser reports.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "sync" => Self::Sync,
            "local" => Self::Local,
            "managed" => Self::Managed,
            "session" => Self::Session,
            other => Self::Other(other.to_owned()),
        }
    }

    /// The browser-facing name of this area.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Sync => "sync",
            Self::Local => "local",
            Self::Managed => "managed",
            Self::Session => "session",
            Self::Other(name) => name,
        }
    }
}

/// Old and new value of one changed key. `None` means absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageChange {
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

/// Asynchronous key-value store holding the persisted theme.
///
/// Change notifications are pushed by the host into the controller rather
/// than subscribed here, so the trait stays object-free.
#[allow(async_fn_in_trait)]
pub trait ConfigStore {
    /// Read the given keys. Missing keys are simply absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<StoredValues, StoreError>;

    /// Write the given values.
    async fn set(&self, values: StoredValues) -> Result<(), StoreError>;
}
