#![forbid(unsafe_code)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use xtint_core::{MutationScheduler, Theme, apply_overrides};
use xtint_harness::{ElementId, FakePage, NodeSpec};

/// A feed cell: card with avatar, text, and an action bar, roughly the shape
/// the page renders per post.
fn cell() -> NodeSpec {
    NodeSpec::new("div")
        .background("rgb(0, 0, 0)")
        .border("0px 0px 1px", "rgb(47, 51, 54)")
        .child(NodeSpec::new("img"))
        .child(
            NodeSpec::new("article")
                .background("rgba(0, 0, 0, 0)")
                .child(NodeSpec::new("p"))
                .child(NodeSpec::new("p"))
                .child(
                    NodeSpec::new("div")
                        .child(NodeSpec::new("button").border("1px", "rgb(83, 100, 113)"))
                        .child(NodeSpec::new("button").border("1px", "rgb(83, 100, 113)"))
                        .child(NodeSpec::svg("svg").child(NodeSpec::svg("path"))),
                ),
        )
}

fn feed(cells: usize) -> (FakePage, Vec<ElementId>) {
    let mut page = FakePage::new();
    let body = page.body_id();
    let roots = (0..cells).map(|_| page.append(body, cell())).collect();
    (page, roots)
}

fn bench_full_tree_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("xtint/pass/full_tree");
    let theme = Theme::dim();
    for cells in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &cells| {
            let (mut page, _) = feed(cells);
            let body = page.body_id();
            b.iter(|| black_box(apply_overrides(&mut page, &body, &theme)));
        });
    }
    group.finish();
}

fn bench_burst_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("xtint/scheduler/burst_flush");
    let theme = Theme::dim();
    for cells in [20usize, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &cells| {
            let (mut page, roots) = feed(cells);
            let mut scheduler = MutationScheduler::new();
            b.iter(|| {
                // Every root reported three times within one frame.
                for _ in 0..3 {
                    for root in &roots {
                        scheduler.enqueue(*root, &mut page);
                    }
                }
                black_box(scheduler.flush(&mut page, &theme))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_tree_pass, bench_burst_flush);
criterion_main!(benches);
