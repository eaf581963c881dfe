//! Child normalization.
//!
//! Node builders accept loosely shaped children: nodes, strings, numbers, nested
//! lists, optional values and booleans. They are flattened into a plain list of
//! [`VNode`]s, with `None` and booleans dropped and scalars wrapped as text.

use super::VNode;
use std::borrow::Cow;

/// Loosely shaped child accepted by node builders.
#[derive(Debug, Clone)]
pub enum Child {
	/// A node, kept as is
	Node(VNode),
	/// Text, wrapped in a text node
	Text(Cow<'static, str>),
	/// Nested list, flattened in place
	List(Vec<Child>),
	/// Dropped (`None`, booleans)
	Skip,
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Self::Node(node)
	}
}

impl From<&'static str> for Child {
	fn from(text: &'static str) -> Self {
		Self::Text(Cow::Borrowed(text))
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Text(Cow::Owned(text))
	}
}

impl From<bool> for Child {
	fn from(_: bool) -> Self {
		Self::Skip
	}
}

macro_rules! numeric_child {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for Child {
				fn from(value: $ty) -> Self {
					Self::Text(Cow::Owned(value.to_string()))
				}
			}
		)*
	};
}

numeric_child!(i32, i64, u32, u64, usize, f64);

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Skip, Into::into)
	}
}

impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(list: Vec<T>) -> Self {
		Self::List(list.into_iter().map(Into::into).collect())
	}
}

/// Flattens loosely shaped children into nodes.
pub fn normalize_children<I>(children: I) -> Vec<VNode>
where
	I: IntoIterator,
	I::Item: Into<Child>,
{
	let mut out = Vec::new();
	for child in children {
		push_child(child.into(), &mut out);
	}
	out
}

fn push_child(child: Child, out: &mut Vec<VNode>) {
	match child {
		Child::Node(node) => out.push(node),
		Child::Text(text) => out.push(VNode::text(text)),
		Child::List(list) => {
			for nested in list {
				push_child(nested, out);
			}
		}
		Child::Skip => {}
	}
}
