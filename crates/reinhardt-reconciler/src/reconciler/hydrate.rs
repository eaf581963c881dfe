//! Hydration of server-rendered content.
//!
//! The virtual tree is walked in lockstep with the existing surface nodes and each
//! virtual node adopts the surface node at its position. Text content is repaired in
//! place. A tag mismatch, a missing node or surplus surface children report that a
//! rebuild is needed, and the root is then mounted from scratch in place of the
//! server-rendered node.

use super::Reconciler;
use super::props::INNER_HTML;
use crate::component::{ComponentInstance, Context};
use crate::error::{ContractViolation, ReconcileResult};
use crate::lifecycle::LifecycleQueue;
use crate::surface::{NodeDescriptor, NodeHandle, Surface};
use crate::vnode::{
	ClassNode, Children, ElementFlavor, ElementNode, FunctionNode, NodeKind, NodeRef, RefTarget,
	VNode,
};

/// Position inside the child list of a surface node.
struct Cursor {
	parent: NodeHandle,
	nodes: Vec<NodeHandle>,
	index: usize,
}

impl Cursor {
	fn current(&self) -> Option<NodeHandle> {
		self.nodes.get(self.index).copied()
	}

	fn exhausted(&self) -> bool {
		self.index >= self.nodes.len()
	}
}

impl<S: Surface> Reconciler<S> {
	/// Attaches `node` to the existing surface node `existing`.
	///
	/// Returns `true` when the content does not match and the subtree has to be
	/// rebuilt. A mismatching node is never modified.
	pub fn hydrate(
		&mut self,
		node: &mut VNode,
		existing: NodeHandle,
		queue: &mut LifecycleQueue,
		context: &Context,
	) -> ReconcileResult<bool> {
		let rebuild = match self.surface.parent_node(existing)? {
			Some(parent) => {
				let nodes = self.surface.child_nodes(parent)?;
				let index = nodes.iter().position(|handle| *handle == existing).unwrap_or(0);
				let mut cursor = Cursor {
					parent,
					nodes,
					index,
				};
				self.hydrate_at(node, &mut cursor, queue, context, false)?
			}
			None => match &mut node.kind {
				NodeKind::Element(element) => {
					let rebuild = self.hydrate_element(element, existing, queue, context, false)?;
					if !rebuild {
						node.dom = Some(existing);
					}
					rebuild
				}
				_ => true,
			},
		};
		let deferred = std::mem::take(&mut self.deferred_will_mount);
		if !rebuild {
			for will_mount in deferred {
				will_mount();
			}
		}
		Ok(rebuild)
	}

	fn hydrate_at(
		&mut self,
		node: &mut VNode,
		cursor: &mut Cursor,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<bool> {
		let VNode { kind, dom, .. } = node;
		match kind {
			NodeKind::Text(text) => {
				*dom = Some(self.hydrate_text(text, cursor)?);
				Ok(false)
			}
			NodeKind::Void => {
				*dom = Some(self.hydrate_placeholder(cursor)?);
				Ok(false)
			}
			NodeKind::Element(element) => {
				let Some(existing) = cursor.current() else {
					return Ok(true);
				};
				if self.hydrate_element(element, existing, queue, context, svg)? {
					return Ok(true);
				}
				*dom = Some(existing);
				cursor.index += 1;
				Ok(false)
			}
			NodeKind::Fragment(fragment) => {
				for child in &mut fragment.children {
					if self.hydrate_at(child, cursor, queue, context, svg)? {
						return Ok(true);
					}
				}
				*dom = Some(self.hydrate_placeholder(cursor)?);
				Ok(false)
			}
			NodeKind::Class(class) => {
				let (rebuild, output) = self.hydrate_class(class, cursor, queue, context, svg)?;
				*dom = output;
				Ok(rebuild)
			}
			NodeKind::Function(function) => {
				let (rebuild, output) = self.hydrate_function(function, cursor, queue, context, svg)?;
				*dom = output;
				Ok(rebuild)
			}
		}
	}

	fn hydrate_text(&mut self, text: &str, cursor: &mut Cursor) -> ReconcileResult<NodeHandle> {
		let existing = match cursor.current() {
			Some(handle) => Some((handle, self.surface.describe(handle)?)),
			None => None,
		};
		let handle = match existing {
			Some((handle, NodeDescriptor::Text(current))) if current.is_empty() == text.is_empty() => {
				if current != text {
					self.surface.set_text(handle, text)?;
				}
				handle
			}
			Some((handle, NodeDescriptor::Text(_))) if !text.is_empty() => {
				// empty where content is expected
				let fresh = self.surface.create_text(text)?;
				self.surface.replace_child(cursor.parent, fresh, handle)?;
				cursor.nodes[cursor.index] = fresh;
				fresh
			}
			_ => {
				let fresh = self.surface.create_text(text)?;
				self.splice_at_cursor(cursor, fresh)?;
				fresh
			}
		};
		cursor.index += 1;
		Ok(handle)
	}

	/// Adopts an empty text node at the cursor or splices in a new one.
	fn hydrate_placeholder(&mut self, cursor: &mut Cursor) -> ReconcileResult<NodeHandle> {
		let handle = match cursor.current() {
			Some(handle) if self.surface.describe(handle)? == NodeDescriptor::Text(String::new()) => {
				handle
			}
			_ => {
				let fresh = self.surface.create_placeholder()?;
				self.splice_at_cursor(cursor, fresh)?;
				fresh
			}
		};
		cursor.index += 1;
		Ok(handle)
	}

	fn splice_at_cursor(&mut self, cursor: &mut Cursor, fresh: NodeHandle) -> ReconcileResult<()> {
		self.surface
			.insert_or_append(cursor.parent, fresh, cursor.current())?;
		cursor.nodes.insert(cursor.index, fresh);
		Ok(())
	}

	fn hydrate_element(
		&mut self,
		element: &mut ElementNode,
		existing: NodeHandle,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<bool> {
		match self.surface.describe(existing)? {
			NodeDescriptor::Element { tag } if tag.eq_ignore_ascii_case(&element.tag) => {}
			found => {
				tracing::debug!(expected = %element.tag, ?found, "hydration tag mismatch");
				return Ok(true);
			}
		}
		let svg = svg || element.flavor == ElementFlavor::Svg;

		let mut cursor = Cursor {
			parent: existing,
			nodes: self.surface.child_nodes(existing)?,
			index: 0,
		};
		match &mut element.children {
			Children::None => {
				if !cursor.exhausted() && !element.props.contains(INNER_HTML) {
					return Ok(true);
				}
			}
			Children::Text(text) => {
				let matches = match cursor.nodes.as_slice() {
					[only] => self.surface.describe(*only)? == NodeDescriptor::Text(text.to_string()),
					_ => false,
				};
				if !matches {
					self.surface.set_text_content(existing, text)?;
				}
			}
			Children::Single(child) => {
				if self.hydrate_at(child, &mut cursor, queue, context, svg)? || !cursor.exhausted() {
					return Ok(true);
				}
			}
			Children::Many(children) => {
				for child in children.iter_mut() {
					if self.hydrate_at(child, &mut cursor, queue, context, svg)? {
						return Ok(true);
					}
				}
				if !cursor.exhausted() {
					return Ok(true);
				}
			}
		}

		self.mount_ref(
			element.node_ref.as_ref(),
			RefTarget::Node(existing),
			&element.tag,
			queue,
		)?;
		if element.flavor.is_controllable() {
			self.attach_binding(existing, &element.props)?;
		}
		self.mount_props(existing, &element.props, svg)?;
		Ok(false)
	}

	fn hydrate_class(
		&mut self,
		class: &mut ClassNode,
		cursor: &mut Cursor,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<(bool, Option<NodeHandle>)> {
		let mut props = class.props.clone();
		if let Some(defaults) = class.component.default_props() {
			props.merge_defaults(&defaults);
		}
		let (instance, mut output) = ComponentInstance::create(&class.component, props, context);
		let child_context = instance.child_context();
		let rebuild = self.hydrate_at(&mut output, cursor, queue, &child_context, svg)?;
		let dom = output.dom;
		if let Some(first) = super::first_handle(&output) {
			self.instances.insert(instance.id(), first);
		}
		instance.set_rendered(Box::new(output));
		class.instance = Some(instance.clone());
		if rebuild {
			return Ok((true, dom));
		}

		self.mount_ref(
			class.node_ref.as_ref(),
			RefTarget::Instance(instance.clone()),
			class.component.name(),
			queue,
		)?;
		queue.add_listener(move || instance.did_mount());
		Ok((false, dom))
	}

	fn hydrate_function(
		&mut self,
		function: &mut FunctionNode,
		cursor: &mut Cursor,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<(bool, Option<NodeHandle>)> {
		if let Some(NodeRef::Callback(_)) = &function.node_ref {
			self.report(ContractViolation::FunctionComponentRef {
				component: function.component.name(),
			})?;
		}
		let mut output = function
			.component
			.call(&function.props, context)
			.into_node()
			.unwrap_or_else(VNode::void);
		let rebuild = self.hydrate_at(&mut output, cursor, queue, context, svg)?;
		let dom = output.dom;
		let first = super::first_handle(&output);
		function.rendered = Some(Box::new(output));
		if rebuild {
			return Ok((true, dom));
		}

		if let Some(hooks) = function.hooks() {
			// runs once the whole tree is known to match
			if let Some(will_mount) = hooks.will_mount.clone() {
				self.deferred_will_mount.push(will_mount);
			}
			if let (Some(did_mount), Some(first)) = (hooks.did_mount.clone(), first) {
				queue.add_listener(move || did_mount(first));
			}
		}
		Ok((false, dom))
	}

	/// Child of `container` carrying the hydration marker attribute.
	fn hydration_root(&self, container: NodeHandle) -> ReconcileResult<Option<NodeHandle>> {
		let marker = self.options.hydration_marker.as_str();
		for child in self.surface.child_nodes(container)? {
			if matches!(self.surface.describe(child)?, NodeDescriptor::Element { .. })
				&& self.surface.get_attribute(child, marker)?.is_some()
			{
				return Ok(Some(child));
			}
		}
		Ok(None)
	}

	/// First render into a container: hydrates marked server content when present,
	/// mounts otherwise.
	pub(crate) fn hydrate_or_mount(
		&mut self,
		tree: &mut VNode,
		container: NodeHandle,
		queue: &mut LifecycleQueue,
	) -> ReconcileResult<()> {
		let root = if self.options.hydrate {
			self.hydration_root(container)?
		} else {
			None
		};
		let Some(existing) = root else {
			self.mount(tree, Some(container), queue, &Context::new(), false)?;
			return Ok(());
		};

		tracing::debug!(%container, %existing, "hydrating server-rendered root");
		let mut hydrated = LifecycleQueue::new();
		if !self.hydrate(tree, existing, &mut hydrated, &Context::new())? {
			let marker = self.options.hydration_marker.clone();
			self.surface.remove_attribute(existing, &marker)?;
			queue.append(&mut hydrated);
			tracing::debug!(%container, "hydration finished");
			return Ok(());
		}

		tracing::warn!(%container, "server-rendered content does not match, rebuilding root");
		self.release_abandoned(tree)?;
		// instances and outputs created while hydrating are mounted as they are,
		// so no will-mount runs twice
		self.rebuilding = true;
		let mounted = self.mount(tree, None, queue, &Context::new(), false);
		self.rebuilding = false;
		self.surface.replace_child(container, mounted?, existing)?;
		Ok(())
	}

	/// Drops the input bindings and instance entries of a tree that is
	/// abandoned without being unmounted.
	pub(super) fn release_abandoned(&mut self, node: &mut VNode) -> ReconcileResult<()> {
		match &mut node.kind {
			NodeKind::Text(_) | NodeKind::Void => {}
			NodeKind::Element(element) => {
				if let Some(dom) = node.dom {
					self.release_binding(dom)?;
				}
				match &mut element.children {
					Children::Single(child) => self.release_abandoned(child)?,
					Children::Many(children) => {
						for child in children {
							self.release_abandoned(child)?;
						}
					}
					Children::None | Children::Text(_) => {}
				}
			}
			NodeKind::Fragment(fragment) => {
				for child in &mut fragment.children {
					self.release_abandoned(child)?;
				}
			}
			NodeKind::Class(class) => {
				if let Some(instance) = &class.instance {
					self.instances.remove(&instance.id());
					if let Some(mut rendered) = instance.take_rendered() {
						let released = self.release_abandoned(&mut rendered);
						instance.set_rendered(rendered);
						released?;
					}
				}
			}
			NodeKind::Function(function) => {
				if let Some(rendered) = &mut function.rendered {
					self.release_abandoned(rendered)?;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::surface::{MemorySurface, SurfaceOp};
	use rstest::{fixture, rstest};

	struct Server {
		reconciler: Reconciler<MemorySurface>,
		container: NodeHandle,
		root: NodeHandle,
	}

	/// `<div data-rh-root><h1>Title</h1><p>body</p></div>` built directly on the surface.
	#[fixture]
	fn server() -> Server {
		let mut surface = MemorySurface::new();
		let container = surface.create_container().unwrap();
		let root = surface.create_element("div", false).unwrap();
		surface.set_attribute(root, "data-rh-root", "").unwrap();
		let heading = surface.create_element("h1", false).unwrap();
		let title = surface.create_text("Title").unwrap();
		surface.append_child(heading, title).unwrap();
		let body = surface.create_element("p", false).unwrap();
		let text = surface.create_text("body").unwrap();
		surface.append_child(body, text).unwrap();
		surface.append_child(root, heading).unwrap();
		surface.append_child(root, body).unwrap();
		surface.append_child(container, root).unwrap();
		surface.clear_ops();
		Server {
			reconciler: Reconciler::new(surface),
			container,
			root,
		}
	}

	fn page(body: &'static str) -> VNode {
		VNode::element("div")
			.child(VNode::element("h1").child("Title"))
			.child(VNode::element("p").child(body))
	}

	#[rstest]
	fn test_matching_content_is_adopted(mut server: Server) {
		// Act
		server.reconciler.render(Some(page("body")), server.container).unwrap();

		// Assert
		let tree = server.reconciler.root(server.container).unwrap();
		assert_eq!(tree.dom(), Some(server.root));
		let ops = server.reconciler.surface().ops();
		assert!(!ops.iter().any(SurfaceOp::is_create));
		assert_eq!(
			server.reconciler.surface().inner_to_html(server.container),
			"<div><h1>Title</h1><p>body</p></div>"
		);
	}

	#[rstest]
	fn test_text_is_repaired_in_place(mut server: Server) {
		server.reconciler.render(Some(page("changed")), server.container).unwrap();

		let tree = server.reconciler.root(server.container).unwrap();
		assert_eq!(tree.dom(), Some(server.root));
		assert_eq!(
			server.reconciler.surface().inner_to_html(server.container),
			"<div><h1>Title</h1><p>changed</p></div>"
		);
	}

	#[rstest]
	fn test_tag_mismatch_leaves_node_untouched(mut server: Server) {
		// Arrange
		let mut tree = VNode::element("section");
		let mut queue = LifecycleQueue::new();

		// Act
		let rebuild = server
			.reconciler
			.hydrate(&mut tree, server.root, &mut queue, &Context::new())
			.unwrap();

		// Assert
		assert!(rebuild);
		assert!(server.reconciler.surface().ops().is_empty());
		assert_eq!(tree.dom(), None);
	}

	#[rstest]
	fn test_mismatch_rebuilds_root(mut server: Server) {
		let tree = VNode::element("div").child(VNode::element("h2").child("Other"));

		server.reconciler.render(Some(tree), server.container).unwrap();

		let root = server.reconciler.root(server.container).unwrap().dom().unwrap();
		assert_ne!(root, server.root);
		assert_eq!(
			server.reconciler.surface().inner_to_html(server.container),
			"<div><h2>Other</h2></div>"
		);
	}

	#[rstest]
	fn test_fragment_marker_is_spliced_in(mut server: Server) {
		let tree = VNode::element("div").child(VNode::fragment([
			VNode::element("h1").child("Title"),
			VNode::element("p").child("body"),
		]));

		server.reconciler.render(Some(tree), server.container).unwrap();

		let surface = server.reconciler.surface();
		assert_eq!(surface.child_nodes(server.root).unwrap().len(), 3);
		assert_eq!(
			surface.inner_to_html(server.container),
			"<div><h1>Title</h1><p>body</p></div>"
		);
	}

	#[rstest]
	fn test_hydration_can_be_disabled() {
		let mut surface = MemorySurface::new();
		let container = surface.create_container().unwrap();
		let existing = surface.create_element("div", false).unwrap();
		surface.set_attribute(existing, "data-rh-root", "").unwrap();
		surface.append_child(container, existing).unwrap();
		let options = crate::config::ReconcilerOptions::new().hydrate(false);
		let mut reconciler = Reconciler::with_options(surface, options);

		reconciler.render(Some(VNode::element("div")), container).unwrap();

		assert_eq!(reconciler.surface().child_nodes(container).unwrap().len(), 2);
	}
}
