#![forbid(unsafe_code)]

//! In-memory page implementing every host capability.
//!
//! Computed styles are whatever the test says they are; the fake performs
//! no cascade. Inline writes are recorded separately so tests can assert on
//! exactly what the themer changed. Frames are manually stepped: a request
//! only bumps a counter, and the test decides when the frame "fires".

use std::collections::BTreeMap;

use xtint_backend::{
    AddedNode, ComputedStyle, ComputedStyleReader, ElementTree, FrameRequester, MutationKind,
    MutationRecord, MutationSource, StyleMutator,
};

/// Handle to a node in a [`FakePage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Handle to an active observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(u32);

/// Fake page failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakePageError {
    #[error("inline style writes are disabled")]
    WritesDisabled,
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),
}

/// Declarative element description for building fixtures.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    tag: String,
    id: Option<String>,
    html: bool,
    editable: Option<bool>,
    style: ComputedStyle,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// An HTML element with a transparent, borderless computed style.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            id: None,
            html: true,
            editable: None,
            style: ComputedStyle::default(),
            children: Vec::new(),
        }
    }

    /// An SVG-namespace element. Tag names keep their case, as in the DOM.
    pub fn svg(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            html: false,
            ..Self::new(tag)
        }
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    /// Set `contenteditable` explicitly; descendants inherit it.
    #[must_use]
    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    #[must_use]
    pub fn background(mut self, color: &str) -> Self {
        self.style.background_color = color.to_owned();
        self
    }

    #[must_use]
    pub fn background_image(mut self, image: &str) -> Self {
        self.style.background_image = image.to_owned();
        self
    }

    /// Same width and color on all four sides.
    #[must_use]
    pub fn border(mut self, width: &str, color: &str) -> Self {
        self.style.border_width = xtint_backend::BorderSides::uniform(width.to_owned());
        self.style.border_color = xtint_backend::BorderSides::uniform(color.to_owned());
        self
    }

    #[must_use]
    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct FakeNode {
    tag: String,
    id: Option<String>,
    html: bool,
    editable: Option<bool>,
    style: ComputedStyle,
    inline: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

#[derive(Debug)]
struct StyleTag {
    id: String,
    parent: ElementId,
    css: String,
}

/// Deterministic in-memory page.
#[derive(Debug)]
pub struct FakePage {
    nodes: Vec<FakeNode>,
    html: ElementId,
    head: Option<ElementId>,
    body: Option<ElementId>,
    style_tags: Vec<StyleTag>,
    pending_frames: usize,
    frames_requested: usize,
    observations: Vec<(ObservationId, ElementId)>,
    next_observation: u32,
    disconnects: usize,
    records: Vec<MutationRecord<ElementId>>,
    inline_writes: usize,
    writes_disabled: bool,
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePage {
    /// `<html>` with an empty `<head>` and `<body>`.
    pub fn new() -> Self {
        let mut page = Self::bare();
        let html = page.html;
        page.head = Some(page.attach(Some(html), &NodeSpec::new("head")));
        page.body = Some(page.attach(Some(html), &NodeSpec::new("body")));
        page
    }

    /// `<html>` with a `<body>` but no `<head>`.
    pub fn without_head() -> Self {
        let mut page = Self::bare();
        let html = page.html;
        page.body = Some(page.attach(Some(html), &NodeSpec::new("body")));
        page
    }

    /// `<html>` only: neither head nor body exist yet.
    pub fn bare() -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            html: ElementId(0),
            head: None,
            body: None,
            style_tags: Vec::new(),
            pending_frames: 0,
            frames_requested: 0,
            observations: Vec::new(),
            next_observation: 0,
            disconnects: 0,
            records: Vec::new(),
            inline_writes: 0,
            writes_disabled: false,
        };
        page.html = page.attach(None, &NodeSpec::new("html"));
        page
    }

    pub fn html(&self) -> ElementId {
        self.html
    }

    pub fn head(&self) -> Option<ElementId> {
        self.head
    }

    /// # Panics
    /// Panics when the page was built without a body.
    pub fn body_id(&self) -> ElementId {
        self.body.expect("fake page has no body")
    }

    /// Insert `spec` (and its children) as the last child of `parent`.
    ///
    /// Active observations covering `parent` receive one child-list record
    /// naming only the inserted root, like a real observer.
    pub fn append(&mut self, parent: ElementId, spec: NodeSpec) -> ElementId {
        let id = self.attach(Some(parent), &spec);
        self.record(parent, MutationKind::ChildList, vec![AddedNode::Element(id)]);
        id
    }

    /// Insert a text node under `parent`. Only observable as a mutation.
    pub fn append_text(&mut self, parent: ElementId) {
        self.record(parent, MutationKind::ChildList, vec![AddedNode::Other]);
    }

    /// Simulate an attribute change on `element`.
    pub fn touch_attribute(&mut self, element: ElementId) {
        self.record(element, MutationKind::Attributes, Vec::new());
    }

    /// Replace the computed style of `element`.
    pub fn set_computed(&mut self, element: ElementId, style: ComputedStyle) {
        self.nodes[element.0].style = style;
    }

    /// Inline value the themer wrote for `property`, if any.
    pub fn inline(&self, element: ElementId, property: &str) -> Option<&str> {
        self.nodes[element.0].inline.get(property).map(String::as_str)
    }

    /// Whether the themer wrote any inline property on `element`.
    pub fn is_untouched(&self, element: ElementId) -> bool {
        self.nodes[element.0].inline.is_empty()
    }

    /// Total inline property writes so far.
    pub fn inline_writes(&self) -> usize {
        self.inline_writes
    }

    /// Make every inline write fail from now on.
    pub fn disable_writes(&mut self) {
        self.writes_disabled = true;
    }

    /// Text of the injected style element with `id`.
    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.style_tags
            .iter()
            .find(|tag| tag.id == id)
            .map(|tag| tag.css.as_str())
    }

    /// Parent the style element with `id` was inserted into.
    pub fn stylesheet_parent(&self, id: &str) -> Option<ElementId> {
        self.style_tags
            .iter()
            .find(|tag| tag.id == id)
            .map(|tag| tag.parent)
    }

    /// Number of style elements ever created.
    pub fn style_tag_count(&self) -> usize {
        self.style_tags.len()
    }

    /// Frame requests made so far.
    pub fn frames_requested(&self) -> usize {
        self.frames_requested
    }

    /// Consume one outstanding frame request. Returns `false` if none is
    /// outstanding.
    pub fn fire_frame(&mut self) -> bool {
        if self.pending_frames == 0 {
            return false;
        }
        self.pending_frames -= 1;
        true
    }

    /// Drain mutation records produced since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord<ElementId>> {
        std::mem::take(&mut self.records)
    }

    /// Roots of the currently active observations.
    pub fn observed_roots(&self) -> Vec<ElementId> {
        self.observations.iter().map(|(_, root)| *root).collect()
    }

    /// Observations disconnected so far.
    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    fn attach(&mut self, parent: Option<ElementId>, spec: &NodeSpec) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(FakeNode {
            tag: spec.tag.clone(),
            id: spec.id.clone(),
            html: spec.html,
            editable: spec.editable,
            style: spec.style.clone(),
            inline: BTreeMap::new(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        for child in &spec.children {
            self.attach(Some(id), child);
        }
        id
    }

    fn is_inclusive_ancestor(&self, ancestor: ElementId, mut node: ElementId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn record(&mut self, target: ElementId, kind: MutationKind, added: Vec<AddedNode<ElementId>>) {
        let observers = self
            .observations
            .iter()
            .filter(|(_, root)| self.is_inclusive_ancestor(*root, target))
            .count();
        for _ in 0..observers {
            self.records.push(MutationRecord {
                kind,
                added_nodes: added.clone(),
            });
        }
    }

    fn collect_descendants(&self, node: ElementId, out: &mut Vec<ElementId>) {
        for &child in &self.nodes[node.0].children {
            out.push(child);
            self.collect_descendants(child, out);
        }
    }

    fn matches(&self, node: ElementId, selector: &str) -> bool {
        let fake = &self.nodes[node.0];
        match selector.strip_prefix('#') {
            Some(id) => fake.id.as_deref() == Some(id),
            None => fake.tag.eq_ignore_ascii_case(selector),
        }
    }
}

impl ElementTree for FakePage {
    type Element = ElementId;

    fn is_html_element(&self, element: &ElementId) -> bool {
        self.nodes.get(element.0).is_some_and(|n| n.html)
    }

    fn tag_name(&self, element: &ElementId) -> String {
        self.nodes[element.0].tag.clone()
    }

    fn is_content_editable(&self, element: &ElementId) -> bool {
        let mut node = Some(*element);
        while let Some(id) = node {
            if let Some(editable) = self.nodes[id.0].editable {
                return editable;
            }
            node = self.nodes[id.0].parent;
        }
        false
    }

    fn descendants(&self, root: &ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.collect_descendants(*root, &mut out);
        out
    }

    /// Supports `#id` and bare tag selectors only.
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        std::iter::once(self.html)
            .chain(self.descendants(&self.html))
            .find(|&node| self.matches(node, selector))
    }

    fn body(&self) -> Option<ElementId> {
        self.body
    }
}

impl ComputedStyleReader for FakePage {
    fn computed_style(&self, element: &ElementId) -> Option<ComputedStyle> {
        self.nodes.get(element.0).map(|n| n.style.clone())
    }
}

impl StyleMutator for FakePage {
    type Error = FakePageError;

    fn set_important_property(
        &mut self,
        element: &ElementId,
        property: &str,
        value: &str,
    ) -> Result<(), FakePageError> {
        if self.writes_disabled {
            return Err(FakePageError::WritesDisabled);
        }
        let node = self
            .nodes
            .get_mut(element.0)
            .ok_or(FakePageError::UnknownElement(*element))?;
        node.inline.insert(property.to_owned(), value.to_owned());
        self.inline_writes += 1;
        Ok(())
    }

    fn install_stylesheet(&mut self, id: &str, css: &str) -> Result<(), FakePageError> {
        if let Some(tag) = self.style_tags.iter_mut().find(|tag| tag.id == id) {
            tag.css = css.to_owned();
            return Ok(());
        }
        let parent = self.head.unwrap_or(self.html);
        self.style_tags.push(StyleTag {
            id: id.to_owned(),
            parent,
            css: css.to_owned(),
        });
        Ok(())
    }
}

impl FrameRequester for FakePage {
    fn request_frame(&mut self) {
        self.frames_requested += 1;
        self.pending_frames += 1;
    }
}

impl MutationSource for FakePage {
    type Observation = ObservationId;

    fn observe_subtree(&mut self, root: &ElementId) -> ObservationId {
        let id = ObservationId(self.next_observation);
        self.next_observation += 1;
        self.observations.push((id, *root));
        tracing::trace!(target: "xtint.harness", observation = ?id, root = ?root, "fake observation started");
        id
    }

    fn disconnect(&mut self, observation: ObservationId) {
        self.observations.retain(|(id, _)| *id != observation);
        self.disconnects += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendants_are_in_document_order() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let root = page.append(
            body,
            NodeSpec::new("div")
                .child(NodeSpec::new("p").child(NodeSpec::new("span")))
                .child(NodeSpec::new("ul")),
        );
        let tags: Vec<String> = page
            .descendants(&root)
            .iter()
            .map(|el| page.tag_name(el))
            .collect();
        assert_eq!(tags, vec!["P", "SPAN", "UL"]);
    }

    #[test]
    fn editable_is_inherited_until_overridden() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let root = page.append(
            body,
            NodeSpec::new("div")
                .editable(true)
                .child(NodeSpec::new("p").child(NodeSpec::new("b").editable(false))),
        );
        let kids = page.descendants(&root);
        assert!(page.is_content_editable(&root));
        assert!(page.is_content_editable(&kids[0]));
        assert!(!page.is_content_editable(&kids[1]));
    }

    #[test]
    fn query_selector_by_id_and_tag() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let root = page.append(body, NodeSpec::new("div").id("react-root"));
        assert_eq!(page.query_selector("#react-root"), Some(root));
        assert_eq!(page.query_selector("body"), Some(body));
        assert_eq!(page.query_selector("#missing"), None);
    }

    #[test]
    fn mutations_only_reach_observed_subtrees() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let head = page.head().unwrap();
        let observation = page.observe_subtree(&body);
        page.append(head, NodeSpec::new("meta"));
        assert!(page.take_mutations().is_empty());

        let div = page.append(body, NodeSpec::new("div"));
        page.append_text(div);
        let records = page.take_mutations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].added_nodes, vec![AddedNode::Element(div)]);
        assert_eq!(records[1].added_nodes, vec![AddedNode::Other]);

        page.disconnect(observation);
        page.append(body, NodeSpec::new("div"));
        assert!(page.take_mutations().is_empty());
    }

    #[test]
    fn stylesheet_falls_back_to_root_without_head() {
        let mut page = FakePage::without_head();
        page.install_stylesheet("theme", "a {}").unwrap();
        assert_eq!(page.stylesheet_parent("theme"), Some(page.html()));
        page.install_stylesheet("theme", "b {}").unwrap();
        assert_eq!(page.stylesheet("theme"), Some("b {}"));
        assert_eq!(page.style_tag_count(), 1);
    }

    #[test]
    fn frames_are_manually_stepped() {
        let mut page = FakePage::new();
        assert!(!page.fire_frame());
        page.request_frame();
        assert_eq!(page.frames_requested(), 1);
        assert!(page.fire_frame());
        assert!(!page.fire_frame());
    }

    #[tracing_test::traced_test]
    #[test]
    fn observation_events_use_harness_target() {
        let mut page = FakePage::new();
        let body = page.body_id();
        page.observe_subtree(&body);
        assert!(logs_contain("xtint.harness"));
        assert!(logs_contain("fake observation started"));
    }
}
