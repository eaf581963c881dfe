//! Recycling pools.
//!
//! Unmounted elements and components may be parked here together with their surface
//! subtree. A later mount of a node with the same type (tag or component) and key
//! takes one out and patches it into shape instead of building from scratch.

use crate::component::ComponentType;
use crate::vnode::{Key, NodeKind, VNode};
use std::borrow::Cow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Default)]
struct Pool {
	non_keyed: Vec<VNode>,
	keyed: HashMap<Key, Vec<VNode>>,
}

impl Pool {
	fn take(&mut self, key: Option<&Key>) -> Option<VNode> {
		match key {
			Some(key) => self.keyed.get_mut(key)?.pop(),
			None => self.non_keyed.pop(),
		}
	}

	fn put(&mut self, node: VNode) {
		match node.key.clone() {
			Some(key) => self.keyed.entry(key).or_default().push(node),
			None => self.non_keyed.push(node),
		}
	}

	fn len(&self) -> usize {
		self.non_keyed.len() + self.keyed.values().map(Vec::len).sum::<usize>()
	}
}

/// Element and component pools.
#[derive(Debug)]
pub struct Pools {
	enabled: bool,
	elements: HashMap<Cow<'static, str>, Pool>,
	components: HashMap<ComponentType, Pool>,
}

impl Pools {
	/// Creates empty pools.
	pub fn new(enabled: bool) -> Self {
		Self {
			enabled,
			elements: HashMap::new(),
			components: HashMap::new(),
		}
	}

	/// Whether recycling is on.
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// Turns recycling off for good and drops every pooled node.
	pub fn disable(&mut self) {
		self.enabled = false;
		self.elements.clear();
		self.components.clear();
	}

	/// Total number of pooled nodes.
	pub fn len(&self) -> usize {
		self.elements.values().map(Pool::len).sum::<usize>()
			+ self.components.values().map(Pool::len).sum::<usize>()
	}

	/// Whether nothing is pooled.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of pooled elements with the given tag.
	pub fn element_count(&self, tag: &str) -> usize {
		self.elements.get(tag).map_or(0, Pool::len)
	}

	/// Number of pooled nodes of a component type.
	pub fn component_count(&self, component: ComponentType) -> usize {
		self.components.get(&component).map_or(0, Pool::len)
	}

	pub(crate) fn take_element(&mut self, tag: &str, key: Option<&Key>) -> Option<VNode> {
		take_from(&mut self.elements, tag, key)
	}

	pub(crate) fn take_component(
		&mut self,
		component: ComponentType,
		key: Option<&Key>,
	) -> Option<VNode> {
		take_from(&mut self.components, &component, key)
	}

	/// Parks an unmounted node. Returns `false` when the node is not poolable.
	pub(crate) fn put(&mut self, node: VNode) -> bool {
		if !self.enabled {
			return false;
		}
		match &node.kind {
			NodeKind::Element(element) => {
				let tag = element.tag.clone();
				self.elements.entry(tag).or_default().put(node);
				true
			}
			NodeKind::Class(class) => {
				let component = class.component.component_type();
				self.components.entry(component).or_default().put(node);
				true
			}
			NodeKind::Function(function) => {
				if function.hooks().is_some_and(|hooks| hooks.blocks_recycling()) {
					return false;
				}
				let component = function.component.component_type();
				self.components.entry(component).or_default().put(node);
				true
			}
			NodeKind::Text(_) | NodeKind::Void | NodeKind::Fragment(_) => false,
		}
	}
}

fn take_from<K, Q>(pools: &mut HashMap<K, Pool>, name: &Q, key: Option<&Key>) -> Option<VNode>
where
	K: std::borrow::Borrow<Q> + Eq + Hash,
	Q: Eq + Hash + ?Sized,
{
	let node = pools.get_mut(name)?.take(key);
	if node.is_some() {
		tracing::debug!(keyed = key.is_some(), "recycled node taken from pool");
	}
	node
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_keyed_and_non_keyed_are_separate() {
		// Arrange
		let mut pools = Pools::new(true);
		pools.put(VNode::element("li"));
		pools.put(VNode::element("li").key("a"));

		// Act
		let keyed = pools.take_element("li", Some(&Key::from("a")));
		let missing = pools.take_element("li", Some(&Key::from("b")));
		let plain = pools.take_element("li", None);

		// Assert
		assert_eq!(keyed.and_then(|n| n.key), Some(Key::from("a")));
		assert!(missing.is_none());
		assert!(plain.is_some_and(|n| n.key.is_none()));
		assert!(pools.is_empty());
	}

	#[rstest]
	fn test_disabled_pools_reject() {
		let mut pools = Pools::new(true);
		pools.put(VNode::element("p"));

		pools.disable();

		assert!(!pools.put(VNode::element("p")));
		assert_eq!(pools.element_count("p"), 0);
	}

	#[rstest]
	fn test_text_and_fragments_are_not_pooled() {
		let mut pools = Pools::new(true);

		assert!(!pools.put(VNode::text("x")));
		assert!(!pools.put(VNode::fragment(["a"])));
		assert!(!pools.put(VNode::void()));
	}
}
