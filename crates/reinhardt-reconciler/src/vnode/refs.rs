//! Node references.

use crate::component::{ComponentInstance, LifecycleHooks};
use crate::surface::NodeHandle;
use std::fmt;
use std::rc::Rc;

/// What a callback ref receives.
#[derive(Debug, Clone)]
pub enum RefTarget {
	/// Surface handle of an element
	Node(NodeHandle),
	/// Instance of a class component
	Instance(ComponentInstance),
}

impl RefTarget {
	/// The surface handle, for element refs.
	pub fn node(&self) -> Option<NodeHandle> {
		match self {
			Self::Node(handle) => Some(*handle),
			Self::Instance(_) => None,
		}
	}

	/// The instance, for class component refs.
	pub fn instance(&self) -> Option<&ComponentInstance> {
		match self {
			Self::Node(_) => None,
			Self::Instance(instance) => Some(instance),
		}
	}
}

/// Callback ref. Called with `Some` after mount and `None` on unmount.
pub type RefCallback = Rc<dyn Fn(Option<RefTarget>)>;

/// The `ref` slot of a node.
#[derive(Clone)]
pub enum NodeRef {
	/// Callback ref, valid on elements and class components
	Callback(RefCallback),
	/// Lifecycle hook bag, valid on function components
	Hooks(LifecycleHooks),
}

impl NodeRef {
	/// Wraps a closure as a callback ref.
	pub fn callback(f: impl Fn(Option<RefTarget>) + 'static) -> Self {
		Self::Callback(Rc::new(f))
	}
}

impl fmt::Debug for NodeRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Callback(_) => write!(f, "Callback(..)"),
			Self::Hooks(hooks) => f.debug_tuple("Hooks").field(hooks).finish(),
		}
	}
}

impl From<LifecycleHooks> for NodeRef {
	fn from(hooks: LifecycleHooks) -> Self {
		Self::Hooks(hooks)
	}
}
