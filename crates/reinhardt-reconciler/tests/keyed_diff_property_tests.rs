//! Property-based tests for the keyed children diff
//!
//! Uses proptest to verify:
//! 1. Any keyed list converges to any other keyed list
//! 2. Surviving keys keep their surface nodes
//! 3. A permutation moves exactly n - LIS children
//! 4. Non-keyed lists converge as well

use proptest::prelude::*;
use reinhardt_reconciler::prelude::*;
use reinhardt_reconciler::reconciler::longest_increasing_subsequence;
use rstest::rstest;
use std::collections::HashMap;

struct List {
	reconciler: Reconciler<MemorySurface>,
	container: NodeHandle,
}

impl List {
	fn new() -> Self {
		let mut surface = MemorySurface::new();
		let container = surface.create_container().unwrap();
		Self {
			reconciler: Reconciler::new(surface),
			container,
		}
	}

	fn render(&mut self, keys: &[usize], keyed: bool) {
		let items = keys.iter().map(|key| {
			let item = VNode::element("li").text_content(key.to_string());
			if keyed { item.key(*key) } else { item }
		});
		self.reconciler
			.render(Some(VNode::element("ul").children(items)), self.container)
			.unwrap();
	}

	fn items(&self) -> Vec<String> {
		let surface = self.reconciler.surface();
		let ul = surface.child_nodes(self.container).unwrap()[0];
		surface
			.child_nodes(ul)
			.unwrap()
			.into_iter()
			.map(|li| surface.text_content(li))
			.collect()
	}

	fn handles(&self) -> HashMap<String, NodeHandle> {
		let surface = self.reconciler.surface();
		let ul = surface.child_nodes(self.container).unwrap()[0];
		surface
			.child_nodes(ul)
			.unwrap()
			.into_iter()
			.map(|li| (surface.text_content(li), li))
			.collect()
	}
}

fn labels(keys: &[usize]) -> Vec<String> {
	keys.iter().map(usize::to_string).collect()
}

fn keyed_list(max: usize) -> impl Strategy<Value = Vec<usize>> {
	proptest::sample::subsequence((0..max).collect::<Vec<_>>(), 0..max).prop_shuffle()
}

fn permutation_pair() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
	(1usize..24).prop_flat_map(|n| {
		let keys: Vec<usize> = (0..n).collect();
		(Just(keys.clone()).prop_shuffle(), Just(keys).prop_shuffle())
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(128))]

	/// Property: the surface ends up in the order of the new keys
	#[rstest]
	fn test_keyed_lists_converge(before in keyed_list(30), after in keyed_list(30)) {
		let mut list = List::new();
		list.render(&before, true);

		list.render(&after, true);

		prop_assert_eq!(list.items(), labels(&after));
	}

	/// Property: keys present on both sides keep their surface node
	#[rstest]
	fn test_surviving_keys_keep_nodes(before in keyed_list(20), after in keyed_list(20)) {
		let mut list = List::new();
		list.reconciler.disable_recycling();
		list.render(&before, true);
		let old = list.handles();

		list.render(&after, true);

		let new = list.handles();
		for key in after.iter().filter(|key| before.contains(key)) {
			let label = key.to_string();
			prop_assert_eq!(old.get(&label), new.get(&label));
		}
	}

	/// Property: a permutation moves exactly the children off the longest increasing run
	#[rstest]
	fn test_permutation_moves_are_minimal((before, after) in permutation_pair()) {
		let mut list = List::new();
		list.render(&before, true);
		list.reconciler.surface_mut().clear_ops();

		list.render(&after, true);

		let sources: Vec<Option<usize>> = after
			.iter()
			.map(|key| before.iter().position(|old| old == key))
			.collect();
		let expected = after.len() - longest_increasing_subsequence(&sources).len();
		let moves = list
			.reconciler
			.surface()
			.ops()
			.iter()
			.filter(|op| op.is_move())
			.count();
		prop_assert_eq!(moves, expected);
		prop_assert!(!list.reconciler.surface().ops().iter().any(SurfaceOp::is_create));
		prop_assert_eq!(list.items(), labels(&after));
	}

	/// Property: position based patching converges for any lengths
	#[rstest]
	fn test_non_keyed_lists_converge(before in keyed_list(12), after in keyed_list(12)) {
		let mut list = List::new();
		list.render(&before, false);

		list.render(&after, false);

		prop_assert_eq!(list.items(), labels(&after));
		prop_assert!(!list.reconciler.surface().ops().iter().any(SurfaceOp::is_move));
	}
}
