//! Component render output.

use crate::vnode::{Child, VNode, normalize_children};

/// What a component produces when rendered.
#[derive(Debug, Clone)]
pub enum Render {
	/// A single node
	Node(VNode),
	/// Several sibling nodes, mounted as a fragment
	Nodes(Vec<VNode>),
	/// Nothing, mounted as a placeholder
	Empty,
	/// Keep the previous output untouched
	NoOp,
}

impl Render {
	/// Normalizes loosely shaped children into a render output.
	pub fn children<I>(children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		Self::Nodes(normalize_children(children))
	}

	/// Converts into a mountable node. `None` means "reuse the previous output".
	pub(crate) fn into_node(self) -> Option<VNode> {
		match self {
			Self::Node(node) => Some(node),
			Self::Nodes(nodes) => Some(VNode::fragment(nodes)),
			Self::Empty => Some(VNode::void()),
			Self::NoOp => None,
		}
	}
}

impl From<VNode> for Render {
	fn from(node: VNode) -> Self {
		Self::Node(node)
	}
}

impl From<Vec<VNode>> for Render {
	fn from(nodes: Vec<VNode>) -> Self {
		Self::Nodes(nodes)
	}
}

impl From<Option<VNode>> for Render {
	fn from(node: Option<VNode>) -> Self {
		node.map_or(Self::Empty, Self::Node)
	}
}

impl From<&'static str> for Render {
	fn from(text: &'static str) -> Self {
		Self::Node(VNode::text(text))
	}
}

impl From<String> for Render {
	fn from(text: String) -> Self {
		Self::Node(VNode::text(text))
	}
}
