//! First materialization of a virtual subtree.

use super::{Reconciler, collect_handles, first_handle};
use crate::component::{ComponentInstance, Context};
use crate::error::{ContractViolation, ReconcileError, ReconcileResult};
use crate::lifecycle::LifecycleQueue;
use crate::surface::{NodeHandle, Surface};
use crate::vnode::{
	Children, ClassNode, ElementFlavor, ElementNode, FragmentNode, FunctionNode, NodeKind,
	NodeRef, RefTarget, VNode,
};

impl<S: Surface> Reconciler<S> {
	/// Mounts `node` and appends it to `parent` when one is given.
	///
	/// Returns the handle to insert into a parent. For fragments this is a grouping
	/// node that is already empty when `parent` was given.
	pub fn mount(
		&mut self,
		node: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<NodeHandle> {
		if self.pools.is_enabled()
			&& !self.rebuilding
			&& let Some(handle) = self.recycle(node, queue, context, svg)?
		{
			self.attach(parent, handle)?;
			return Ok(handle);
		}

		let VNode { kind, dom, .. } = node;
		let handle = match kind {
			NodeKind::Text(text) => {
				let handle = self.surface.create_text(text)?;
				*dom = Some(handle);
				handle
			}
			NodeKind::Void => {
				let handle = self.surface.create_placeholder()?;
				*dom = Some(handle);
				handle
			}
			NodeKind::Element(element) => {
				let handle = self.mount_element(element, queue, context, svg)?;
				*dom = Some(handle);
				handle
			}
			NodeKind::Fragment(fragment) => {
				let (group, marker) = self.mount_fragment(fragment, queue, context, svg)?;
				*dom = Some(marker);
				group
			}
			NodeKind::Class(class) => {
				let (handle, output) = self.mount_class(class, queue, context, svg)?;
				*dom = output;
				handle
			}
			NodeKind::Function(function) => {
				let (handle, output) = self.mount_function(function, queue, context, svg)?;
				*dom = output;
				handle
			}
		};
		self.attach(parent, handle)?;
		Ok(handle)
	}

	/// Mounts a child list into `parent`, before `anchor` when given.
	pub(crate) fn mount_children(
		&mut self,
		children: &mut [VNode],
		parent: NodeHandle,
		anchor: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		for child in children {
			match anchor {
				None => {
					self.mount(child, Some(parent), queue, context, svg)?;
				}
				Some(anchor) => {
					let handle = self.mount(child, None, queue, context, svg)?;
					self.surface.insert_before(parent, handle, anchor)?;
				}
			}
		}
		Ok(())
	}

	/// Queues a callback ref with its target, or reports a hook bag where a
	/// callback is required.
	pub(crate) fn mount_ref(
		&mut self,
		node_ref: Option<&NodeRef>,
		target: RefTarget,
		owner: &str,
		queue: &mut LifecycleQueue,
	) -> ReconcileResult<()> {
		match node_ref {
			None => Ok(()),
			Some(NodeRef::Callback(callback)) => {
				let callback = callback.clone();
				queue.add_listener(move || callback(Some(target)));
				Ok(())
			}
			Some(NodeRef::Hooks(_)) => self.report(ContractViolation::NonCallbackRef {
				target: owner.to_string(),
			}),
		}
	}

	pub(crate) fn attach(&mut self, parent: Option<NodeHandle>, handle: NodeHandle) -> ReconcileResult<()> {
		if let Some(parent) = parent {
			self.surface.append_child(parent, handle)?;
		}
		Ok(())
	}

	/// A single handle standing for every top level handle of `node`, grouping them
	/// when there are several.
	pub(crate) fn insertable(&mut self, node: &VNode) -> ReconcileResult<NodeHandle> {
		let handles = collect_handles(node);
		if let [single] = handles.as_slice() {
			return Ok(*single);
		}
		let group = self.surface.create_fragment()?;
		for handle in handles {
			self.surface.append_child(group, handle)?;
		}
		Ok(group)
	}

	fn mount_element(
		&mut self,
		element: &mut ElementNode,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<NodeHandle> {
		let svg = svg || element.flavor == ElementFlavor::Svg;
		let dom = self.surface.create_element(&element.tag, svg)?;
		self.mount_ref(
			element.node_ref.as_ref(),
			RefTarget::Node(dom),
			&element.tag,
			queue,
		)?;

		match &mut element.children {
			Children::None => {}
			Children::Text(text) => self.surface.set_text_content(dom, text)?,
			Children::Single(child) => {
				self.mount(child, Some(dom), queue, context, svg)?;
			}
			Children::Many(children) => {
				self.mount_children(children, dom, None, queue, context, svg)?
			}
		}
		if element.flavor.is_controllable() {
			self.attach_binding(dom, &element.props)?;
		}
		self.mount_props(dom, &element.props, svg)?;
		Ok(dom)
	}

	/// Returns the grouping node and the end marker.
	fn mount_fragment(
		&mut self,
		fragment: &mut FragmentNode,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<(NodeHandle, NodeHandle)> {
		let group = self.surface.create_fragment()?;
		self.mount_children(&mut fragment.children, group, None, queue, context, svg)?;
		let marker = self.surface.create_placeholder()?;
		self.surface.append_child(group, marker)?;
		Ok((group, marker))
	}

	/// Returns the insertable handle and the `dom` of the rendered output.
	fn mount_class(
		&mut self,
		class: &mut ClassNode,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<(NodeHandle, Option<NodeHandle>)> {
		let mut props = class.props.clone();
		if let Some(defaults) = class.component.default_props() {
			props.merge_defaults(&defaults);
		}
		// an instance left by a failed hydration already ran its will-mount
		let adopted = class
			.instance
			.take()
			.filter(|instance| !instance.is_unmounted())
			.and_then(|instance| instance.take_rendered().map(|output| (instance, *output)));
		let (instance, mut output) = match adopted {
			Some(adopted) => adopted,
			None => ComponentInstance::create(&class.component, props, context),
		};
		let child_context = instance.child_context();
		let handle = self.mount(&mut output, None, queue, &child_context, svg)?;
		if let Some(first) = first_handle(&output) {
			self.instances.insert(instance.id(), first);
		}
		let dom = output.dom;
		instance.set_rendered(Box::new(output));

		self.mount_ref(
			class.node_ref.as_ref(),
			RefTarget::Instance(instance.clone()),
			class.component.name(),
			queue,
		)?;
		let mounted = instance.clone();
		queue.add_listener(move || mounted.did_mount());
		class.instance = Some(instance);
		Ok((handle, dom))
	}

	fn mount_function(
		&mut self,
		function: &mut FunctionNode,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<(NodeHandle, Option<NodeHandle>)> {
		if let Some(NodeRef::Callback(_)) = &function.node_ref {
			self.report(ContractViolation::FunctionComponentRef {
				component: function.component.name(),
			})?;
		}
		let mut output = match function.rendered.take() {
			Some(rendered) => *rendered,
			None => function
				.component
				.call(&function.props, context)
				.into_node()
				.unwrap_or_else(VNode::void),
		};
		let handle = self.mount(&mut output, None, queue, context, svg)?;
		let dom = output.dom;
		let first = first_handle(&output).unwrap_or(handle);
		function.rendered = Some(Box::new(output));

		if let Some(hooks) = function.hooks() {
			if let Some(will_mount) = &hooks.will_mount {
				will_mount();
			}
			if let Some(did_mount) = hooks.did_mount.clone() {
				queue.add_listener(move || did_mount(first));
			}
		}
		Ok((handle, dom))
	}

	/// Reuses a pooled node of the same type and key, if any.
	fn recycle(
		&mut self,
		node: &mut VNode,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<Option<NodeHandle>> {
		match &node.kind {
			NodeKind::Element(element) => {
				let Some(mut pooled) = self.pools.take_element(&element.tag, node.key.as_ref())
				else {
					return Ok(None);
				};
				// the pooled ref already saw its teardown, the new one must see the mount
				if let NodeKind::Element(pooled_element) = &mut pooled.kind {
					pooled_element.node_ref = None;
				}
				self.patch(pooled, node, None, queue, context, svg)?;
				node.dom
					.map(Some)
					.ok_or_else(|| ReconcileError::unmounted("recycle"))
			}
			NodeKind::Class(_) | NodeKind::Function(_) => {
				let pooled = node
					.component_type()
					.and_then(|component| self.pools.take_component(component, node.key.as_ref()));
				let Some(pooled) = pooled else {
					return Ok(None);
				};
				if !self.patch_component(pooled, node, None, queue, context, svg)? {
					return Ok(None);
				}
				self.insertable(node).map(Some)
			}
			NodeKind::Text(_) | NodeKind::Void | NodeKind::Fragment(_) => Ok(None),
		}
	}
}
