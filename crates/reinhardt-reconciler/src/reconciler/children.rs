//! Child list reconciliation.
//!
//! Keyed lists go through prefix and suffix trimming, single element moves between
//! the ends, and finally a full match whose placement keeps a longest increasing
//! subsequence of the matched children in place. Only children off that run are
//! moved, which is the minimum number of moves for the permutation.

use super::lis::longest_increasing_subsequence;
use super::{Reconciler, collect_handles, first_handle};
use crate::component::Context;
use crate::error::{ReconcileError, ReconcileResult};
use crate::lifecycle::LifecycleQueue;
use crate::surface::{NodeHandle, Surface};
use crate::vnode::{ChildFlags, Children, Key, VNode};
use std::collections::HashMap;

/// Below these sizes the full match scans instead of building a key index.
const SCAN_WINDOW: usize = 4;
const SCAN_PRODUCT: usize = 16;

fn is_keyed(last: &[VNode], next: &[VNode], (last_flags, next_flags): (ChildFlags, ChildFlags)) -> bool {
	if last_flags == ChildFlags::Keyed && next_flags == ChildFlags::Keyed {
		return true;
	}
	if next_flags == ChildFlags::NonKeyed {
		return false;
	}
	matches!(
		(last.first(), next.first()),
		(Some(old), Some(new)) if old.key.is_some() && new.key.is_some()
	)
}

fn slot_key(slots: &[Option<VNode>], index: usize) -> Option<&Key> {
	slots[index].as_ref().and_then(|node| node.key.as_ref())
}

fn same_key(slots: &[Option<VNode>], index: usize, node: &VNode) -> bool {
	slots[index].is_some() && slot_key(slots, index) == node.key.as_ref()
}

fn take(slots: &mut [Option<VNode>], index: usize) -> ReconcileResult<VNode> {
	slots[index]
		.take()
		.ok_or_else(|| ReconcileError::invalid("patch_children", "old child was already consumed"))
}

/// Insertion anchor for the child right after `position`.
fn anchor_after(next: &[VNode], position: usize, tail: Option<NodeHandle>) -> Option<NodeHandle> {
	next.get(position + 1).and_then(first_handle).or(tail)
}

impl<S: Surface> Reconciler<S> {
	/// Patches the children of an element across every shape transition.
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn patch_element_children(
		&mut self,
		last: Children,
		next: &mut Children,
		flags: (ChildFlags, ChildFlags),
		dom: NodeHandle,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		match (last, next) {
			(Children::None, Children::None) => {}
			(Children::Text(old), Children::Text(new)) => {
				if old != *new {
					self.surface.set_text_content(dom, new)?;
				}
			}
			(Children::Single(old), Children::Single(new)) => {
				self.patch(*old, new, Some(dom), queue, context, svg)?
			}
			(Children::Many(old), Children::Many(new)) => {
				self.patch_child_list(old, new, flags, dom, None, queue, context, svg)?
			}
			(last, next) => {
				self.remove_element_children(last, dom)?;
				match next {
					Children::None => {}
					Children::Text(text) => self.surface.set_text_content(dom, text)?,
					Children::Single(child) => {
						self.mount(child, Some(dom), queue, context, svg)?;
					}
					Children::Many(list) => {
						self.mount_children(list, dom, None, queue, context, svg)?
					}
				}
			}
		}
		Ok(())
	}

	fn remove_element_children(&mut self, last: Children, dom: NodeHandle) -> ReconcileResult<()> {
		match last {
			Children::None => Ok(()),
			Children::Text(_) => Ok(self.surface.clear_children(dom)?),
			Children::Single(child) => self.unmount(*child, Some(dom), true),
			Children::Many(list) => self.remove_all_children(dom, list),
		}
	}

	/// Empties `dom` in one surface call, then tears the children down.
	fn remove_all_children(&mut self, dom: NodeHandle, children: Vec<VNode>) -> ReconcileResult<()> {
		self.surface.clear_children(dom)?;
		for child in children {
			self.unmount(child, None, true)?;
		}
		Ok(())
	}

	/// Patches a child list living in `parent`. `tail` is the node the list ends
	/// before, `None` when the list runs to the end of `parent`.
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn patch_child_list(
		&mut self,
		last: Vec<VNode>,
		next: &mut [VNode],
		flags: (ChildFlags, ChildFlags),
		parent: NodeHandle,
		tail: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		if last.is_empty() {
			return self.mount_children(next, parent, tail, queue, context, svg);
		}
		if next.is_empty() {
			if tail.is_none() {
				return self.remove_all_children(parent, last);
			}
			for child in last {
				self.unmount(child, Some(parent), false)?;
			}
			return Ok(());
		}
		if is_keyed(&last, next, flags) {
			self.patch_keyed(last, next, parent, tail, queue, context, svg)
		} else {
			self.patch_non_keyed(last, next, parent, tail, queue, context, svg)
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_non_keyed(
		&mut self,
		last: Vec<VNode>,
		next: &mut [VNode],
		parent: NodeHandle,
		tail: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let mut old = last.into_iter();
		for child in next.iter_mut() {
			match old.next() {
				Some(previous) => self.patch(previous, child, Some(parent), queue, context, svg)?,
				None => self.mount_at(child, parent, tail, queue, context, svg)?,
			}
		}
		for leftover in old {
			self.unmount(leftover, Some(parent), false)?;
		}
		Ok(())
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_keyed(
		&mut self,
		last: Vec<VNode>,
		next: &mut [VNode],
		parent: NodeHandle,
		tail: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let total = last.len();
		let mut a: Vec<Option<VNode>> = last.into_iter().map(Some).collect();
		let (mut a_start, mut a_end) = (0, a.len());
		let (mut b_start, mut b_end) = (0, next.len());

		loop {
			while a_start < a_end && b_start < b_end && same_key(&a, a_start, &next[b_start]) {
				let old = take(&mut a, a_start)?;
				self.patch(old, &mut next[b_start], Some(parent), queue, context, svg)?;
				a_start += 1;
				b_start += 1;
			}
			while a_start < a_end && b_start < b_end && same_key(&a, a_end - 1, &next[b_end - 1]) {
				let old = take(&mut a, a_end - 1)?;
				self.patch(old, &mut next[b_end - 1], Some(parent), queue, context, svg)?;
				a_end -= 1;
				b_end -= 1;
			}
			if a_start >= a_end || b_start >= b_end {
				break;
			}

			// old tail became the new head
			if same_key(&a, a_end - 1, &next[b_start]) {
				let old = take(&mut a, a_end - 1)?;
				self.patch(old, &mut next[b_start], Some(parent), queue, context, svg)?;
				let anchor = a[a_start].as_ref().and_then(first_handle).or(tail);
				self.move_node(&next[b_start], parent, anchor)?;
				a_end -= 1;
				b_start += 1;
				continue;
			}
			// old head became the new tail
			if same_key(&a, a_start, &next[b_end - 1]) {
				let old = take(&mut a, a_start)?;
				self.patch(old, &mut next[b_end - 1], Some(parent), queue, context, svg)?;
				let anchor = anchor_after(next, b_end - 1, tail);
				self.move_node(&next[b_end - 1], parent, anchor)?;
				a_start += 1;
				b_end -= 1;
				continue;
			}
			break;
		}

		if a_start >= a_end {
			let anchor = next.get(b_end).and_then(first_handle).or(tail);
			for position in b_start..b_end {
				self.mount_at(&mut next[position], parent, anchor, queue, context, svg)?;
			}
			return Ok(());
		}
		if b_start >= b_end {
			for index in a_start..a_end {
				let old = take(&mut a, index)?;
				self.unmount(old, Some(parent), false)?;
			}
			return Ok(());
		}

		let a_len = a_end - a_start;
		let b_len = b_end - b_start;
		let matches = {
			let mut matches: Vec<(usize, usize)> = Vec::new();
			let mut taken = vec![false; b_len];
			if b_len <= SCAN_WINDOW || a_len * b_len <= SCAN_PRODUCT {
				for i in a_start..a_end {
					if matches.len() >= b_len {
						break;
					}
					let key = slot_key(&a, i);
					if let Some(j) =
						(b_start..b_end).find(|&j| !taken[j - b_start] && next[j].key.as_ref() == key)
					{
						taken[j - b_start] = true;
						matches.push((i, j));
					}
				}
			} else {
				let index: HashMap<Option<&Key>, usize> = (b_start..b_end)
					.map(|j| (next[j].key.as_ref(), j))
					.collect();
				for i in a_start..a_end {
					if matches.len() >= b_len {
						break;
					}
					if let Some(&j) = index.get(&slot_key(&a, i))
						&& !taken[j - b_start]
					{
						taken[j - b_start] = true;
						matches.push((i, j));
					}
				}
			}
			matches
		};

		let mut sources: Vec<Option<usize>> = vec![None; b_len];
		let mut moved = false;
		let mut pos = 0;
		for &(i, j) in &matches {
			sources[j - b_start] = Some(i);
			if pos > j {
				moved = true;
			} else {
				pos = j;
			}
			let old = take(&mut a, i)?;
			self.patch(old, &mut next[j], Some(parent), queue, context, svg)?;
		}
		let patched = matches.len();

		if a_len == total && patched == 0 {
			tracing::trace!(removed = a_len, added = b_len, "replacing whole keyed list");
			let old: Vec<VNode> = a.into_iter().flatten().collect();
			if tail.is_none() {
				self.remove_all_children(parent, old)?;
			} else {
				for child in old {
					self.unmount(child, Some(parent), false)?;
				}
			}
			return self.mount_children(&mut next[b_start..b_end], parent, tail, queue, context, svg);
		}

		for index in a_start..a_end {
			if let Some(old) = a[index].take() {
				self.unmount(old, Some(parent), false)?;
			}
		}

		if moved {
			let keep = longest_increasing_subsequence(&sources);
			let mut cursor = keep.len();
			for i in (0..b_len).rev() {
				let position = b_start + i;
				let anchor = anchor_after(next, position, tail);
				match sources[i] {
					None => self.mount_at(&mut next[position], parent, anchor, queue, context, svg)?,
					Some(_) if cursor > 0 && keep[cursor - 1] == i => cursor -= 1,
					Some(_) => self.move_node(&next[position], parent, anchor)?,
				}
			}
		} else if patched != b_len {
			for i in (0..b_len).rev() {
				if sources[i].is_none() {
					let position = b_start + i;
					let anchor = anchor_after(next, position, tail);
					self.mount_at(&mut next[position], parent, anchor, queue, context, svg)?;
				}
			}
		}
		Ok(())
	}

	fn mount_at(
		&mut self,
		child: &mut VNode,
		parent: NodeHandle,
		anchor: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let handle = self.mount(child, None, queue, context, svg)?;
		self.surface.insert_or_append(parent, handle, anchor)?;
		Ok(())
	}

	/// Repositions every surface node of a mounted child before `anchor`.
	fn move_node(
		&mut self,
		node: &VNode,
		parent: NodeHandle,
		anchor: Option<NodeHandle>,
	) -> ReconcileResult<()> {
		for handle in collect_handles(node) {
			tracing::trace!(%handle, ?anchor, "moving keyed child");
			self.surface.insert_or_append(parent, handle, anchor)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::surface::{MemorySurface, SurfaceOp};
	use rstest::{fixture, rstest};

	struct Harness {
		reconciler: Reconciler<MemorySurface>,
		container: NodeHandle,
	}

	impl Harness {
		fn render_list(&mut self, keys: &[&'static str]) {
			let list = VNode::element("ul").children(
				keys.iter()
					.map(|key| VNode::element("li").key(*key).text_content(*key)),
			);
			self.reconciler.render(Some(list), self.container).unwrap();
		}

		fn list_text(&self) -> Vec<String> {
			let surface = self.reconciler.surface();
			let ul = surface.child_nodes(self.container).unwrap()[0];
			surface
				.child_nodes(ul)
				.unwrap()
				.into_iter()
				.map(|li| surface.text_content(li))
				.collect()
		}

		fn handle_of(&self, key: &'static str) -> NodeHandle {
			self.reconciler
				.root(self.container)
				.unwrap()
				.child_nodes()
				.iter()
				.find(|child| child.node_key() == Some(&Key::from(key)))
				.and_then(VNode::dom)
				.unwrap()
		}

		fn moved(&mut self) -> Vec<NodeHandle> {
			self.reconciler
				.surface_mut()
				.take_ops()
				.into_iter()
				.filter_map(|op| match op {
					SurfaceOp::Move { child, .. } => Some(child),
					_ => None,
				})
				.collect()
		}
	}

	#[fixture]
	fn harness() -> Harness {
		let mut surface = MemorySurface::new();
		let container = surface.create_container().unwrap();
		Harness {
			reconciler: Reconciler::new(surface),
			container,
		}
	}

	#[rstest]
	#[case(&["a", "b", "c"], &["a", "b", "c", "d"], 0)]
	#[case(&["a", "b", "c"], &["z", "a", "b", "c"], 0)]
	#[case(&["a", "b", "c", "d"], &["a", "d"], 0)]
	#[case(&["a", "b", "c", "d"], &["d", "a", "b", "c"], 1)]
	#[case(&["a", "b", "c", "d"], &["b", "c", "d", "a"], 1)]
	#[case(&["a", "b", "c", "d", "e"], &["c", "a", "b", "e", "d"], 2)]
	#[case(&["a", "b", "c", "d", "e", "f"], &["f", "e", "d", "c", "b", "a"], 5)]
	#[case(&["a", "b"], &["x", "y"], 0)]
	fn test_keyed_patch_order_and_moves(
		mut harness: Harness,
		#[case] before: &[&'static str],
		#[case] after: &[&'static str],
		#[case] moves: usize,
	) {
		// Arrange
		harness.render_list(before);
		harness.reconciler.surface_mut().clear_ops();

		// Act
		harness.render_list(after);

		// Assert
		assert_eq!(harness.list_text(), after);
		assert_eq!(harness.moved().len(), moves);
	}

	#[rstest]
	fn test_lis_members_are_not_touched(mut harness: Harness) {
		harness.render_list(&["a", "b", "c", "d", "e"]);
		let a = harness.handle_of("a");
		let b = harness.handle_of("b");
		harness.reconciler.surface_mut().clear_ops();

		harness.render_list(&["c", "a", "b", "e", "d"]);

		let moved = harness.moved();
		assert!(!moved.contains(&a));
		assert!(!moved.contains(&b));
	}

	#[rstest]
	fn test_keyed_children_keep_their_nodes(mut harness: Harness) {
		harness.render_list(&["a", "b", "c"]);
		let c = harness.handle_of("c");

		harness.render_list(&["c", "x", "a"]);

		assert_eq!(harness.handle_of("c"), c);
		assert_eq!(harness.list_text(), vec!["c", "x", "a"]);
	}

	#[rstest]
	fn test_disjoint_keys_clear_in_one_call(mut harness: Harness) {
		harness.render_list(&["a", "b", "c", "d", "e"]);
		harness.reconciler.surface_mut().clear_ops();

		harness.render_list(&["v", "w", "x", "y", "z"]);

		let ops = harness.reconciler.surface().ops();
		assert_eq!(
			ops.iter()
				.filter(|op| matches!(op, SurfaceOp::ClearChildren { .. }))
				.count(),
			1
		);
		assert!(!ops.iter().any(|op| matches!(op, SurfaceOp::Remove { .. })));
		assert_eq!(harness.list_text(), vec!["v", "w", "x", "y", "z"]);
	}

	#[rstest]
	fn test_non_keyed_patches_by_position(mut harness: Harness) {
		let render = |harness: &mut Harness, items: &[&'static str]| {
			let list = VNode::element("ol").children(items.iter().map(|item| VNode::element("li").text_content(*item)));
			harness.reconciler.render(Some(list), harness.container).unwrap();
		};
		render(&mut harness, &["a", "b", "c"]);
		harness.reconciler.surface_mut().clear_ops();

		render(&mut harness, &["c", "b"]);

		assert_eq!(harness.list_text(), vec!["c", "b"]);
		assert!(harness.moved().is_empty());
	}

	#[rstest]
	fn test_keyed_fragment_between_siblings(mut harness: Harness) {
		// Arrange
		let render = |harness: &mut Harness, keys: &[&'static str]| {
			let items = VNode::fragment(keys.iter().map(|key| VNode::text(*key).key(*key)));
			let tree = VNode::element("div")
				.child(VNode::element("header"))
				.child(items)
				.child(VNode::element("footer"));
			harness.reconciler.render(Some(tree), harness.container).unwrap();
		};
		render(&mut harness, &["a", "b", "c"]);

		// Act
		render(&mut harness, &["c", "a", "d"]);

		// Assert
		assert_eq!(
			harness.reconciler.surface().inner_to_html(harness.container),
			"<div><header></header>cad<footer></footer></div>"
		);
	}

	#[rstest]
	#[case(&[], &["a"], ChildFlags::Unknown, ChildFlags::Unknown, false)]
	#[case(&["a"], &["b"], ChildFlags::Unknown, ChildFlags::Unknown, true)]
	#[case(&["a"], &["b"], ChildFlags::Keyed, ChildFlags::NonKeyed, false)]
	#[case(&[], &[], ChildFlags::Keyed, ChildFlags::Keyed, true)]
	fn test_is_keyed(
		#[case] last: &[&'static str],
		#[case] next: &[&'static str],
		#[case] last_flags: ChildFlags,
		#[case] next_flags: ChildFlags,
		#[case] expected: bool,
	) {
		let keyed = |keys: &[&'static str]| -> Vec<VNode> {
			keys.iter().map(|key| VNode::text(*key).key(*key)).collect()
		};

		assert_eq!(
			is_keyed(&keyed(last), &keyed(next), (last_flags, next_flags)),
			expected
		);
	}
}
