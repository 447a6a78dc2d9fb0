#![forbid(unsafe_code)]

//! `web-sys` implementation of the page capabilities.
//!
//! DOM nodes have no Rust-side identity, so every element handed to the
//! core is tagged with a numeric key kept in a `WeakMap` on the JS side.
//! The same node always maps to the same key, which is what the scheduler's
//! set semantics hash on.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::cell::Cell;

use js_sys::{Array, WeakMap};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MutationObserver, MutationObserverInit, Window};
use xtint_backend::{
    AddedNode, BorderSides, ComputedStyle, ComputedStyleReader, ElementTree, FrameRequester,
    MutationRecord, MutationSource, StyleMutator,
};

use crate::convert::mutation_kind;
use crate::error::HostError;

pub(crate) type FrameCallback = Closure<dyn FnMut(f64)>;
pub(crate) type MutationCallback = Closure<dyn FnMut(Array, MutationObserver)>;

/// A DOM element with a stable identity key.
#[derive(Clone)]
pub struct WebElement {
    key: u64,
    element: Element,
}

impl PartialEq for WebElement {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for WebElement {}

impl Hash for WebElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{}>", self.element.tag_name().to_ascii_lowercase(), self.key)
    }
}

struct Identity {
    keys: WeakMap,
    next: Cell<u64>,
}

impl Identity {
    fn new() -> Self {
        Self {
            keys: WeakMap::new(),
            next: Cell::new(1),
        }
    }

    fn wrap(&self, element: Element) -> WebElement {
        let key = match self.keys.get(&element).as_f64() {
            Some(key) => key as u64,
            None => {
                let key = self.next.get();
                self.next.set(key + 1);
                self.keys.set(&element, &JsValue::from_f64(key as f64));
                key
            }
        };
        WebElement { key, element }
    }
}

/// The live document of the current window.
pub struct WebPage {
    window: Window,
    document: Document,
    identity: Identity,
    on_frame: Option<FrameCallback>,
    on_mutations: Option<MutationCallback>,
}

impl WebPage {
    pub fn from_window() -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::NoWindow)?;
        let document = window.document().ok_or(HostError::NoDocument)?;
        Ok(Self {
            window,
            document,
            identity: Identity::new(),
            on_frame: None,
            on_mutations: None,
        })
    }

    #[must_use]
    pub fn wrap(&self, element: Element) -> WebElement {
        self.identity.wrap(element)
    }

    /// Install the callbacks frames and observers are bound to. The page
    /// keeps them alive.
    pub(crate) fn set_callbacks(&mut self, on_frame: FrameCallback, on_mutations: MutationCallback) {
        self.on_frame = Some(on_frame);
        self.on_mutations = Some(on_mutations);
    }

    /// Convert the records an observer callback received.
    pub(crate) fn convert_records(&self, records: &Array) -> Vec<MutationRecord<WebElement>> {
        records
            .iter()
            .filter_map(|value| value.dyn_into::<web_sys::MutationRecord>().ok())
            .filter_map(|record| {
                let kind = mutation_kind(&record.type_())?;
                let nodes = record.added_nodes();
                let added_nodes = (0..nodes.length())
                    .filter_map(|index| nodes.item(index))
                    .map(|node| match node.dyn_into::<Element>() {
                        Ok(element) => AddedNode::Element(self.wrap(element)),
                        Err(_) => AddedNode::Other,
                    })
                    .collect();
                Some(MutationRecord { kind, added_nodes })
            })
            .collect()
    }
}

impl ElementTree for WebPage {
    type Element = WebElement;

    fn is_html_element(&self, element: &WebElement) -> bool {
        element.element.is_instance_of::<HtmlElement>()
    }

    fn tag_name(&self, element: &WebElement) -> String {
        element.element.tag_name()
    }

    fn is_content_editable(&self, element: &WebElement) -> bool {
        element
            .element
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable)
    }

    fn descendants(&self, root: &WebElement) -> Vec<WebElement> {
        let list = match root.element.query_selector_all("*") {
            Ok(list) => list,
            Err(err) => {
                tracing::debug!(target: "xtint.pass", ?root, err = ?err, "descendant query failed");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| self.wrap(element))
            .collect()
    }

    fn query_selector(&self, selector: &str) -> Option<WebElement> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(|element| self.wrap(element)),
            Err(err) => {
                tracing::debug!(target: "xtint.controller", selector, err = ?err, "invalid selector");
                None
            }
        }
    }

    fn body(&self) -> Option<WebElement> {
        self.document.body().map(|body| self.wrap(body.into()))
    }
}

impl ComputedStyleReader for WebPage {
    fn computed_style(&self, element: &WebElement) -> Option<ComputedStyle> {
        let style = self.window.get_computed_style(&element.element).ok().flatten()?;
        let read = |name: &str| style.get_property_value(name).unwrap_or_default();
        Some(ComputedStyle {
            background_color: read("background-color"),
            background_image: read("background-image"),
            border_width: BorderSides {
                top: read("border-top-width"),
                right: read("border-right-width"),
                bottom: read("border-bottom-width"),
                left: read("border-left-width"),
            },
            border_color: BorderSides {
                top: read("border-top-color"),
                right: read("border-right-color"),
                bottom: read("border-bottom-color"),
                left: read("border-left-color"),
            },
        })
    }
}

impl StyleMutator for WebPage {
    type Error = HostError;

    fn set_important_property(
        &mut self,
        element: &WebElement,
        property: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let html = element.element.dyn_ref::<HtmlElement>().ok_or(HostError::NotHtml)?;
        html.style()
            .set_property_with_priority(property, value, "important")
            .map_err(|err| HostError::dom(&err))
    }

    fn install_stylesheet(&mut self, id: &str, css: &str) -> Result<(), HostError> {
        let tag = match self.document.get_element_by_id(id) {
            Some(tag) => tag,
            None => {
                let tag = self
                    .document
                    .create_element("style")
                    .map_err(|err| HostError::dom(&err))?;
                tag.set_id(id);
                let parent: Element = match self.document.head() {
                    Some(head) => head.into(),
                    None => self.document.document_element().ok_or(HostError::NoDocument)?,
                };
                parent.append_child(&tag).map_err(|err| HostError::dom(&err))?;
                tag
            }
        };
        tag.set_text_content(Some(css));
        Ok(())
    }
}

impl FrameRequester for WebPage {
    fn request_frame(&mut self) {
        let Some(callback) = &self.on_frame else {
            tracing::warn!(target: "xtint.scheduler", "frame requested before callbacks were installed");
            return;
        };
        if let Err(err) = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            tracing::warn!(target: "xtint.scheduler", err = ?err, "requestAnimationFrame failed");
        }
    }
}

impl MutationSource for WebPage {
    /// `None` when the observer could not be created.
    type Observation = Option<MutationObserver>;

    fn observe_subtree(&mut self, root: &WebElement) -> Option<MutationObserver> {
        let callback = self.on_mutations.as_ref()?;
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                tracing::warn!(target: "xtint.observer", err = ?err, "MutationObserver unavailable");
                return None;
            }
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(err) = observer.observe_with_options(&root.element, &options) {
            tracing::warn!(target: "xtint.observer", ?root, err = ?err, "observe failed");
            return None;
        }
        Some(observer)
    }

    fn disconnect(&mut self, observation: Option<MutationObserver>) {
        if let Some(observer) = observation {
            observer.disconnect();
        }
    }
}
