//! Rendering surface abstraction.
//!
//! The reconciler never touches a concrete node tree. Every structural change goes
//! through the [`Surface`] trait and nodes are referred to by opaque [`NodeHandle`]s
//! that the adapter hands out.
//!
//! Two adapters ship with the crate:
//!
//! - [`MemorySurface`]: an in-process node arena with a mutation log, used for tests,
//!   server side rendering and benchmarks
//! - `WebSurface` (feature `web`, wasm32 only): the browser DOM through `web-sys`
//!
//! ## Fragments
//!
//! [`Surface::create_fragment`] returns a grouping node. Appending, inserting or
//! replacing with a grouping node moves its children into the target position and
//! leaves the grouping node empty, like a DOM `DocumentFragment`.
//!
//! ## Controlled inputs
//!
//! When the reconciler binds an [`InputBinding`] to a node the adapter must, on every
//! user interaction of kind [`InputBinding::event`]:
//!
//! 1. capture the value the user produced into the dispatched [`Event`]
//! 2. write [`InputBinding::controlled_value`] back onto the node, and onto every other
//!    bound node sharing the same [`InputBinding::group`]
//! 3. call [`InputBinding::forward`] with the event

mod binding;
mod memory;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

pub use binding::{ControlledValue, Event, EventHandler, InputBinding};
pub use memory::{MemorySurface, SurfaceOp};
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::WebSurface;

use crate::error::SurfaceResult;
use std::fmt;
use std::rc::Rc;

/// SVG namespace URI
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// XLink namespace URI, used for `xlink:*` attributes
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
/// XML namespace URI, used for `xml:*` attributes
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Opaque reference to a node owned by a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
	/// Wraps an adapter specific id.
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the adapter specific id.
	pub const fn raw(self) -> u64 {
		self.0
	}
}

impl fmt::Display for NodeHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// What an existing surface node is, as seen during hydration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDescriptor {
	/// Element with its tag name as reported by the surface
	Element {
		/// Tag name
		tag: String,
	},
	/// Text node with its current content
	Text(String),
	/// Grouping node
	Fragment,
	/// Comments and anything else the reconciler never creates
	Other,
}

/// Operations the reconciler needs from a node tree.
///
/// Every method that takes a handle fails with
/// [`SurfaceError::UnknownHandle`](crate::error::SurfaceError::UnknownHandle) when the
/// handle was not produced by this adapter.
pub trait Surface {
	/// Creates a detached element. `svg` requests the SVG namespace.
	fn create_element(&mut self, tag: &str, svg: bool) -> SurfaceResult<NodeHandle>;

	/// Creates a detached text node.
	fn create_text(&mut self, text: &str) -> SurfaceResult<NodeHandle>;

	/// Creates a detached, empty text node used as a placeholder.
	fn create_placeholder(&mut self) -> SurfaceResult<NodeHandle> {
		self.create_text("")
	}

	/// Creates a detached grouping node.
	fn create_fragment(&mut self) -> SurfaceResult<NodeHandle>;

	/// Sets a plain attribute.
	fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> SurfaceResult<()>;

	/// Sets a namespaced attribute (`xlink:href`, `xml:lang`, ...).
	fn set_attribute_ns(
		&mut self,
		node: NodeHandle,
		namespace: &str,
		name: &str,
		value: &str,
	) -> SurfaceResult<()>;

	/// Removes an attribute. Removing a missing attribute is not an error.
	fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> SurfaceResult<()>;

	/// Reads an attribute.
	fn get_attribute(&self, node: NodeHandle, name: &str) -> SurfaceResult<Option<String>>;

	/// Sets the class list of an HTML element.
	fn set_class_name(&mut self, node: NodeHandle, class: &str) -> SurfaceResult<()>;

	/// Sets (`Some`) or clears (`None`) a single inline style property.
	fn set_style_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: Option<&str>,
	) -> SurfaceResult<()>;

	/// Sets a boolean property such as `checked` or `disabled`.
	fn set_bool_property(&mut self, node: NodeHandle, name: &str, value: bool)
	-> SurfaceResult<()>;

	/// Sets a string property such as `value` or `volume`.
	fn set_value_property(&mut self, node: NodeHandle, name: &str, value: &str)
	-> SurfaceResult<()>;

	/// Replaces the element's content with raw markup.
	fn set_inner_html(&mut self, node: NodeHandle, html: &str) -> SurfaceResult<()>;

	/// Updates the content of a text node.
	fn set_text(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()>;

	/// Replaces all children of an element with a single text node.
	///
	/// An empty string still leaves one empty text child behind.
	fn set_text_content(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()>;

	/// Detaches every child of a node.
	fn clear_children(&mut self, node: NodeHandle) -> SurfaceResult<()>;

	/// Installs (`Some`) or removes (`None`) the listener for an event name.
	fn set_event_listener(
		&mut self,
		node: NodeHandle,
		event: &str,
		handler: Option<EventHandler>,
	) -> SurfaceResult<()>;

	/// Attaches (`Some`) or detaches (`None`) a controlled input binding.
	fn bind_controlled(
		&mut self,
		node: NodeHandle,
		binding: Option<Rc<InputBinding>>,
	) -> SurfaceResult<()>;

	/// Appends `child` as the last child of `parent`, detaching it first if needed.
	fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()>;

	/// Inserts `child` right before `anchor`, detaching it first if needed.
	fn insert_before(
		&mut self,
		parent: NodeHandle,
		child: NodeHandle,
		anchor: NodeHandle,
	) -> SurfaceResult<()>;

	/// Detaches `child` from `parent`.
	fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()>;

	/// Puts `new_child` at the position of `old_child` and detaches `old_child`.
	fn replace_child(
		&mut self,
		parent: NodeHandle,
		new_child: NodeHandle,
		old_child: NodeHandle,
	) -> SurfaceResult<()>;

	/// Lists the children of a node in order.
	fn child_nodes(&self, node: NodeHandle) -> SurfaceResult<Vec<NodeHandle>>;

	/// Returns the parent of a node, if attached.
	fn parent_node(&self, node: NodeHandle) -> SurfaceResult<Option<NodeHandle>>;

	/// Describes an existing node.
	fn describe(&self, node: NodeHandle) -> SurfaceResult<NodeDescriptor>;

	/// Whether the node is the document root, which may not be used as a container.
	fn is_document_root(&self, _node: NodeHandle) -> bool {
		false
	}

	/// Inserts before `anchor` when given, appends otherwise.
	fn insert_or_append(
		&mut self,
		parent: NodeHandle,
		child: NodeHandle,
		anchor: Option<NodeHandle>,
	) -> SurfaceResult<()> {
		match anchor {
			Some(anchor) => self.insert_before(parent, child, anchor),
			None => self.append_child(parent, child),
		}
	}
}
