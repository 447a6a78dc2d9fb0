#![forbid(unsafe_code)]

//! Bridge from page mutations into the scheduler.

use xtint_backend::{
    AddedNode, ElementTree, FrameRequester, MutationKind, MutationRecord, MutationSource,
};

use crate::scheduler::MutationScheduler;

/// Owns at most one active subtree observation.
#[derive(Debug)]
pub struct ObserverBridge<O> {
    observation: Option<O>,
}

impl<O> Default for ObserverBridge<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> ObserverBridge<O> {
    #[must_use]
    pub const fn new() -> Self {
        Self { observation: None }
    }

    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observation.is_some()
    }

    /// (Re)start observation at `root`. Any previous observation is
    /// disconnected first. With no root, the bridge ends up idle.
    pub fn start<P>(&mut self, page: &mut P, root: Option<&P::Element>) -> bool
    where
        P: MutationSource<Observation = O>,
    {
        if let Some(previous) = self.observation.take() {
            page.disconnect(previous);
            tracing::debug!(target: "xtint.observer", "previous observation disconnected");
        }
        let Some(root) = root else {
            tracing::debug!(target: "xtint.observer", "no content root; observation skipped");
            return false;
        };
        self.observation = Some(page.observe_subtree(root));
        tracing::debug!(target: "xtint.observer", ?root, "observing subtree");
        true
    }
}

/// Enqueue every HTML element added by a child-list record. Returns the
/// number of enqueue calls made.
pub fn deliver<P>(
    page: &mut P,
    records: &[MutationRecord<P::Element>],
    scheduler: &mut MutationScheduler<P::Element>,
) -> usize
where
    P: ElementTree + FrameRequester,
{
    let mut delivered = 0;
    for record in records {
        if record.kind != MutationKind::ChildList {
            continue;
        }
        for node in &record.added_nodes {
            let AddedNode::Element(element) = node else {
                continue;
            };
            if !page.is_html_element(element) {
                continue;
            }
            scheduler.enqueue(element.clone(), &mut *page);
            delivered += 1;
        }
    }
    if delivered > 0 {
        tracing::trace!(target: "xtint.observer", delivered, "added elements queued");
    }
    delivered
}
