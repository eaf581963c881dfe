//! Benchmark: keyed children diff
//!
//! Measures patching a 1000 item keyed list through the common reorder shapes
//! against the in-memory surface.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use reinhardt_reconciler::prelude::*;

const ITEMS: usize = 1000;

fn list(keys: &[usize]) -> VNode {
	VNode::element("ul").children(
		keys.iter()
			.map(|key| VNode::element("li").key(*key).text_content(key.to_string())),
	)
}

fn mounted(keys: &[usize]) -> (Reconciler<MemorySurface>, NodeHandle) {
	let mut surface = MemorySurface::new();
	let container = surface.create_container().unwrap();
	let mut reconciler = Reconciler::with_options(surface, ReconcilerOptions::new().recycling(false));
	reconciler.render(Some(list(keys)), container).unwrap();
	reconciler.surface_mut().clear_ops();
	(reconciler, container)
}

fn shapes() -> Vec<(&'static str, Vec<usize>)> {
	let base: Vec<usize> = (0..ITEMS).collect();

	let mut swapped = base.clone();
	swapped.swap(1, ITEMS - 2);

	let mut rotated = base.clone();
	rotated.rotate_right(1);

	let reversed: Vec<usize> = base.iter().rev().copied().collect();

	let mut shuffled = base.clone();
	// deterministic interleave of the two halves
	shuffled.sort_by_key(|key| (key % 2, *key));

	let appended: Vec<usize> = (0..ITEMS + 100).collect();
	let removed: Vec<usize> = base.iter().copied().filter(|key| key % 10 != 0).collect();

	vec![
		("unchanged", base),
		("swap_rows", swapped),
		("rotate", rotated),
		("reverse", reversed),
		("interleave", shuffled),
		("append_100", appended),
		("remove_every_10th", removed),
	]
}

fn benchmark_keyed_patch(c: &mut Criterion) {
	let base: Vec<usize> = (0..ITEMS).collect();
	let mut group = c.benchmark_group("keyed_patch");

	for (name, next) in shapes() {
		group.bench_with_input(BenchmarkId::from_parameter(name), &next, |b, next| {
			b.iter_batched(
				|| mounted(&base),
				|(mut reconciler, container)| {
					reconciler
						.render(Some(black_box(list(next))), container)
						.unwrap();
					reconciler
				},
				criterion::BatchSize::LargeInput,
			);
		});
	}

	group.finish();
}

fn benchmark_mount(c: &mut Criterion) {
	let keys: Vec<usize> = (0..ITEMS).collect();

	c.bench_function("mount_1000_keyed", |b| {
		b.iter(|| black_box(mounted(&keys)));
	});
}

criterion_group!(benches, benchmark_keyed_patch, benchmark_mount);
criterion_main!(benches);
