#![forbid(unsafe_code)]

//! Frame-batched override scheduling.
//!
//! The page can insert dozens of subtrees within a few milliseconds while a
//! feed scrolls. Each insertion is queued here instead of being processed
//! on the spot; one flush per rendering frame then runs the override pass
//! over every distinct queued root.
//!
//! # Invariants
//!
//! - A root is queued at most once per batch (identity, not subtree overlap).
//! - At most one frame request is outstanding at any time.
//! - The pending set and the frame marker are cleared *before* any root is
//!   processed, so roots queued while a batch is being processed land in the
//!   next frame's batch.
//! - Within a batch, roots are processed in first-enqueue order.

use core::fmt::Debug;
use core::hash::Hash;

use ahash::AHashSet;
use xtint_backend::{ComputedStyleReader, FrameRequester, StyleMutator};

use crate::pass::{OverrideStats, apply_overrides};
use crate::theme::Theme;

/// Outcome of one flush.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Distinct roots processed.
    pub roots: usize,
    /// Summed pass counters over all roots.
    pub stats: OverrideStats,
}

/// Lifetime counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Calls to [`MutationScheduler::enqueue`].
    pub enqueued: u64,
    /// Enqueues absorbed because the root was already pending.
    pub coalesced: u64,
    pub frames_requested: u64,
    pub flushes: u64,
}

/// Pending roots plus the "frame already requested" marker.
#[derive(Debug)]
pub struct MutationScheduler<E> {
    order: Vec<E>,
    members: AHashSet<E>,
    frame_scheduled: bool,
    stats: SchedulerStats,
}

impl<E> Default for MutationScheduler<E>
where
    E: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> MutationScheduler<E>
where
    E: Clone + Eq + Hash + Debug,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            members: AHashSet::new(),
            frame_scheduled: false,
            stats: SchedulerStats::default(),
        }
    }

    /// Queue `root` for the next flush, requesting a frame if none is
    /// outstanding. Returns `false` if `root` was already pending.
    pub fn enqueue<F: FrameRequester + ?Sized>(&mut self, root: E, frames: &mut F) -> bool {
        self.stats.enqueued += 1;
        let fresh = self.members.insert(root.clone());
        if fresh {
            self.order.push(root);
        } else {
            self.stats.coalesced += 1;
        }
        if !self.frame_scheduled {
            self.frame_scheduled = true;
            self.stats.frames_requested += 1;
            frames.request_frame();
            tracing::trace!(target: "xtint.scheduler", pending = self.order.len(), "frame requested");
        }
        fresh
    }

    /// Clear the frame marker and hand over the pending roots, leaving the
    /// queue empty.
    pub fn take_batch(&mut self) -> Vec<E> {
        self.frame_scheduled = false;
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    /// Frame callback: take the batch and run one override pass per root.
    pub fn flush<D>(&mut self, doc: &mut D, theme: &Theme) -> FlushReport
    where
        D: ComputedStyleReader<Element = E> + StyleMutator,
    {
        let batch = self.take_batch();
        if batch.is_empty() {
            return FlushReport::default();
        }
        self.stats.flushes += 1;
        let report = process_batch(doc, &batch, theme);
        tracing::debug!(
            target: "xtint.scheduler",
            roots = report.roots,
            visited = report.stats.visited,
            backgrounds = report.stats.backgrounds,
            borders = report.stats.borders,
            "flush complete"
        );
        report
    }

    #[must_use]
    pub fn is_frame_scheduled(&self) -> bool {
        self.frame_scheduled
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_pending(&self, root: &E) -> bool {
        self.members.contains(root)
    }

    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

/// Run the override pass over each root of an already-taken batch.
pub fn process_batch<D>(doc: &mut D, batch: &[D::Element], theme: &Theme) -> FlushReport
where
    D: ComputedStyleReader + StyleMutator,
{
    let _span = tracing::debug_span!("xtint.flush", roots = batch.len()).entered();
    let mut report = FlushReport::default();
    for root in batch {
        report.stats += apply_overrides(doc, root, theme);
        report.roots += 1;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use xtint_backend::ComputedStyle;
    use xtint_harness::{FakePage, NodeSpec};

    #[test]
    fn repeated_enqueue_requests_one_frame() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let mut scheduler = MutationScheduler::new();

        assert!(scheduler.enqueue(body, &mut page));
        assert!(!scheduler.enqueue(body, &mut page));
        assert!(!scheduler.enqueue(body, &mut page));

        assert_eq!(page.frames_requested(), 1);
        assert_eq!(scheduler.pending_len(), 1);
        assert_eq!(scheduler.stats().coalesced, 2);
    }

    #[test]
    fn flush_processes_each_distinct_root_once_in_order() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let a = page.append(body, NodeSpec::new("div").background("rgb(1, 1, 1)"));
        let b = page.append(body, NodeSpec::new("div").background("rgb(2, 2, 2)"));
        let mut scheduler = MutationScheduler::new();
        for root in [a, b, a, b, a] {
            scheduler.enqueue(root, &mut page);
        }
        assert!(page.fire_frame());
        let report = scheduler.flush(&mut page, &Theme::dim());
        assert_eq!(report.roots, 2);
        assert_eq!(report.stats.backgrounds, 2);
        assert!(!scheduler.is_frame_scheduled());
        assert_eq!(scheduler.pending_len(), 0);
    }

    #[test]
    fn take_batch_preserves_first_enqueue_order() {
        let mut page = FakePage::new();
        let mut scheduler = MutationScheduler::new();
        for root in [3u32, 1, 3, 2, 1] {
            scheduler.enqueue(root, &mut page);
        }
        assert_eq!(scheduler.take_batch(), vec![3, 1, 2]);
    }

    #[test]
    fn enqueue_after_take_starts_next_batch() {
        let mut page = FakePage::new();
        let mut scheduler = MutationScheduler::new();
        scheduler.enqueue(1u32, &mut page);
        let batch = scheduler.take_batch();
        assert_eq!(batch, vec![1]);

        // Queued while the previous batch is being processed.
        scheduler.enqueue(1u32, &mut page);
        assert_eq!(page.frames_requested(), 2);
        assert!(scheduler.is_pending(&1));
    }

    #[test]
    fn empty_flush_is_a_no_op() {
        let mut page = FakePage::new();
        let mut scheduler = MutationScheduler::<xtint_harness::ElementId>::new();
        let report = scheduler.flush(&mut page, &Theme::dim());
        assert_eq!(report, FlushReport::default());
        assert_eq!(scheduler.stats().flushes, 0);
    }

    #[test]
    fn flush_sees_style_at_flush_time_not_enqueue_time() {
        let mut page = FakePage::new();
        let body = page.body_id();
        let card = page.append(body, NodeSpec::new("div"));
        let mut scheduler = MutationScheduler::new();
        scheduler.enqueue(card, &mut page);

        // The page repaints the card dark before the frame fires.
        page.set_computed(
            card,
            ComputedStyle {
                background_color: "rgb(0, 0, 0)".into(),
                ..ComputedStyle::default()
            },
        );
        assert!(page.fire_frame());
        let report = scheduler.flush(&mut page, &Theme::dim());
        assert_eq!(report.stats.backgrounds, 1);
        assert_eq!(page.inline(card, "background-color"), Some("#15202b"));
    }
}
