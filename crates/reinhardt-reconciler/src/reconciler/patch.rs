//! Node level patching.
//!
//! Nodes of different kinds, or elements with different tags, are never diffed: the
//! new node is mounted and takes the surface position of the old one.

use super::{Reconciler, collect_handles, first_handle};
use crate::component::Context;
use crate::error::{ContractViolation, ReconcileError, ReconcileResult};
use crate::lifecycle::LifecycleQueue;
use crate::surface::{NodeHandle, Surface};
use crate::vnode::{
	ClassNode, ElementFlavor, ElementNode, FragmentNode, FunctionNode, NodeKind, NodeRef,
	RefTarget, VNode, VNodeKind,
};
use std::rc::Rc;

fn same_shape(last: &VNode, next: &VNode) -> bool {
	match (&last.kind, &next.kind) {
		(NodeKind::Element(old), NodeKind::Element(new)) => old.tag == new.tag,
		_ => last.kind().family() == next.kind().family(),
	}
}

fn same_ref(last: Option<&NodeRef>, next: Option<&NodeRef>) -> bool {
	match (last, next) {
		(None, None) => true,
		(Some(NodeRef::Callback(old)), Some(NodeRef::Callback(new))) => Rc::ptr_eq(old, new),
		_ => false,
	}
}

impl<S: Surface> Reconciler<S> {
	/// Brings the surface of `last` in line with `next`. Afterwards `next` holds the
	/// runtime state and `last` is gone.
	pub fn patch(
		&mut self,
		last: VNode,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		if !same_shape(&last, next) {
			return self.replace_node(last, next, parent, queue, context, svg);
		}
		if last.kind().is_component() {
			if !self.patch_component(last, next, parent, queue, context, svg)? {
				self.mount(next, parent, queue, context, svg)?;
			}
			return Ok(());
		}

		let dom = last.dom.ok_or_else(|| ReconcileError::unmounted("patch"))?;
		next.dom = Some(dom);
		match (last.kind, &mut next.kind) {
			(NodeKind::Text(old), NodeKind::Text(new)) => {
				if old != *new {
					self.surface.set_text(dom, new)?;
				}
			}
			(NodeKind::Void, NodeKind::Void) => {}
			(NodeKind::Element(old), NodeKind::Element(new)) => {
				self.patch_element(old, new, dom, queue, context, svg)?
			}
			(NodeKind::Fragment(old), NodeKind::Fragment(new)) => {
				self.patch_fragment(old, new, dom, queue, context, svg)?
			}
			_ => return Err(ReconcileError::invalid("patch", "node kinds do not match")),
		}
		Ok(())
	}

	/// Patches two component nodes. Returns `false` when `last` cannot be reused
	/// because its instance is gone and there is no parent to mount into.
	pub(crate) fn patch_component(
		&mut self,
		last: VNode,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<bool> {
		if last.component_type() != next.component_type() {
			if next.kind() == VNodeKind::ClassComponent {
				self.replace_node(last, next, parent, queue, context, svg)?;
			} else {
				self.swap_function_component(last, next, parent, queue, context, svg)?;
			}
			return Ok(true);
		}
		let last_dom = last.dom;
		match last.kind {
			NodeKind::Class(old) => self.patch_class(old, last_dom, next, parent, queue, context, svg),
			NodeKind::Function(old) => {
				self.patch_function(old, last_dom, next, parent, queue, context, svg)
			}
			_ => Err(ReconcileError::invalid("patch", "expected a component node")),
		}
	}

	/// Mounts `next` in place of `last` and tears `last` down.
	pub(crate) fn replace_node(
		&mut self,
		last: VNode,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		tracing::trace!(from = ?last.kind(), to = ?next.kind(), "replacing node");
		let old_handles = collect_handles(&last);
		let handle = self.mount(next, None, queue, context, svg)?;
		self.unmount(last, None, false)?;
		self.splice(parent, handle, &old_handles)
	}

	/// Puts `handle` where `old_handles` are and detaches them.
	fn splice(
		&mut self,
		parent: Option<NodeHandle>,
		handle: NodeHandle,
		old_handles: &[NodeHandle],
	) -> ReconcileResult<()> {
		let Some(&first) = old_handles.first() else {
			return self.attach(parent, handle);
		};
		let Some(parent) = self.surface.parent_node(first)? else {
			return Ok(());
		};
		if let [single] = old_handles {
			self.surface.replace_child(parent, handle, *single)?;
			return Ok(());
		}
		self.surface.insert_before(parent, handle, first)?;
		for old in old_handles {
			self.surface.remove_child(parent, *old)?;
		}
		Ok(())
	}

	fn patch_element(
		&mut self,
		old: ElementNode,
		new: &mut ElementNode,
		dom: NodeHandle,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let svg = svg || new.flavor == ElementFlavor::Svg;
		if !same_ref(old.node_ref.as_ref(), new.node_ref.as_ref()) {
			self.mount_ref(new.node_ref.as_ref(), RefTarget::Node(dom), &new.tag, queue)?;
		}
		self.patch_element_children(
			old.children,
			&mut new.children,
			(old.child_flags, new.child_flags),
			dom,
			queue,
			context,
			svg,
		)?;
		if new.flavor.is_controllable() {
			self.validate_binding(dom, &new.props)?;
		}
		self.patch_props(&old.props, &new.props, dom, svg)
	}

	fn patch_fragment(
		&mut self,
		old: FragmentNode,
		new: &mut FragmentNode,
		marker: NodeHandle,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let parent = match self.surface.parent_node(marker)? {
			Some(parent) => parent,
			None => {
				// detached fragment: gather its nodes so positions stay meaningful
				let group = self.surface.create_fragment()?;
				for child in &old.children {
					for handle in collect_handles(child) {
						self.surface.append_child(group, handle)?;
					}
				}
				self.surface.append_child(group, marker)?;
				group
			}
		};
		self.patch_child_list(
			old.children,
			&mut new.children,
			(old.child_flags, new.child_flags),
			parent,
			Some(marker),
			queue,
			context,
			svg,
		)
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_class(
		&mut self,
		old: ClassNode,
		last_dom: Option<NodeHandle>,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<bool> {
		let instance = old.instance.ok_or_else(|| {
			ReconcileError::invalid(
				"patch",
				format!("class component {} has no instance", old.component.name()),
			)
		})?;
		let NodeKind::Class(new) = &mut next.kind else {
			return Err(ReconcileError::invalid("patch", "expected a class component"));
		};

		if instance.is_unmounted() {
			if parent.is_none() {
				return Ok(false);
			}
			let old_handles = instance
				.with_rendered(|rendered| rendered.map(collect_handles))
				.unwrap_or_default();
			let handle = self.mount(next, None, queue, context, svg)?;
			self.splice(parent, handle, &old_handles)?;
			return Ok(true);
		}

		let mut props = new.props.clone();
		if let Some(defaults) = new.component.default_props() {
			props.merge_defaults(&defaults);
		}
		new.instance = Some(instance.clone());
		let update = instance.update(props, context);
		let Some(mut output) = update.output else {
			next.dom = last_dom;
			return Ok(true);
		};

		let previous = instance.take_rendered().ok_or_else(|| {
			ReconcileError::invalid("patch", "class component has no rendered output")
		})?;
		let child_context = instance.child_context();
		self.patch(*previous, &mut output, parent, queue, &child_context, svg)?;
		next.dom = output.dom;
		if let Some(first) = first_handle(&output) {
			self.instances.insert(instance.id(), first);
		}
		instance.set_rendered(Box::new(output));
		instance.did_update(&update.prev_props, update.prev_state.as_ref());
		Ok(true)
	}

	#[allow(clippy::too_many_arguments)]
	fn patch_function(
		&mut self,
		old: FunctionNode,
		last_dom: Option<NodeHandle>,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<bool> {
		let previous = old.rendered.ok_or_else(|| {
			ReconcileError::invalid(
				"patch",
				format!("function component {} has no rendered output", old.component.name()),
			)
		})?;
		let NodeKind::Function(new) = &mut next.kind else {
			return Err(ReconcileError::invalid("patch", "expected a function component"));
		};
		let hooks = new.hooks().cloned();

		let proceed = hooks
			.as_ref()
			.is_none_or(|hooks| hooks.should_update(&old.props, &new.props));
		if proceed
			&& let Some(will_update) = hooks.as_ref().and_then(|hooks| hooks.will_update.clone())
		{
			will_update(&old.props, &new.props);
		}
		let rendered = if proceed {
			new.component.call(&new.props, context).into_node()
		} else {
			None
		};
		let Some(mut output) = rendered else {
			new.rendered = Some(previous);
			next.dom = last_dom;
			return Ok(true);
		};

		self.patch(*previous, &mut output, parent, queue, context, svg)?;
		let dom = output.dom;
		new.rendered = Some(Box::new(output));
		if let Some(did_update) = hooks.as_ref().and_then(|hooks| hooks.did_update.clone()) {
			did_update(&old.props, &new.props);
		}
		next.dom = dom;
		Ok(true)
	}

	/// Replaces a component with a function component of another type, reusing the
	/// old rendered output as the base of the new one.
	fn swap_function_component(
		&mut self,
		mut last: VNode,
		next: &mut VNode,
		parent: Option<NodeHandle>,
		queue: &mut LifecycleQueue,
		context: &Context,
		svg: bool,
	) -> ReconcileResult<()> {
		let previous = match &mut last.kind {
			NodeKind::Class(class) => class
				.instance
				.as_ref()
				.and_then(|instance| instance.take_rendered()),
			NodeKind::Function(function) => function.rendered.take(),
			_ => None,
		}
		.ok_or_else(|| ReconcileError::invalid("patch", "component has no rendered output"))?;
		let NodeKind::Function(new) = &mut next.kind else {
			return Err(ReconcileError::invalid("patch", "expected a function component"));
		};
		if let Some(NodeRef::Callback(_)) = &new.node_ref {
			self.report(ContractViolation::FunctionComponentRef {
				component: new.component.name(),
			})?;
		}

		let output = match new.component.call(&new.props, context).into_node() {
			Some(mut output) => {
				self.patch(*previous, &mut output, parent, queue, context, svg)?;
				output
			}
			None => *previous,
		};
		let dom = output.dom;
		let first = first_handle(&output);
		new.rendered = Some(Box::new(output));
		if let Some(hooks) = new.hooks() {
			if let Some(will_mount) = &hooks.will_mount {
				will_mount();
			}
			if let (Some(did_mount), Some(first)) = (hooks.did_mount.clone(), first) {
				queue.add_listener(move || did_mount(first));
			}
		}
		next.dom = dom;
		self.teardown(&mut last)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::component::{FunctionComponent, LifecycleHooks, Render};
	use crate::surface::{MemorySurface, SurfaceOp};
	use crate::vnode::Props;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;

	struct Harness {
		reconciler: Reconciler<MemorySurface>,
		container: NodeHandle,
	}

	impl Harness {
		fn render(&mut self, tree: VNode) {
			self.reconciler.render(Some(tree), self.container).unwrap();
		}

		fn html(&self) -> String {
			self.reconciler.surface().inner_to_html(self.container)
		}

		fn take_ops(&mut self) -> Vec<SurfaceOp> {
			self.reconciler.surface_mut().take_ops()
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

	fn label(props: &Props, _: &Context) -> Render {
		match props.get_str("text") {
			Some("skip") => Render::NoOp,
			Some(text) => VNode::element("span").text_content(text.to_string()).into(),
			None => Render::Empty,
		}
	}

	fn heading(props: &Props, _: &Context) -> Render {
		VNode::element("span")
			.class_name("heading")
			.text_content(props.get_str("text").unwrap_or_default().to_string())
			.into()
	}

	const LABEL: FunctionComponent = FunctionComponent::new("Label", label);
	const HEADING: FunctionComponent = FunctionComponent::new("Heading", heading);

	#[rstest]
	fn test_text_update_is_a_single_mutation(mut harness: Harness) {
		// Arrange
		harness.render(VNode::element("p").child("a").child(VNode::element("b")));
		let text = harness.reconciler.root(harness.container).unwrap().child_nodes()[0]
			.dom()
			.unwrap();
		harness.take_ops();

		// Act
		harness.render(VNode::element("p").child("b").child(VNode::element("b")));

		// Assert
		assert_eq!(
			harness.take_ops(),
			vec![SurfaceOp::SetText {
				node: text,
				text: "b".to_string()
			}]
		);
	}

	#[rstest]
	fn test_tag_change_replaces_in_place(mut harness: Harness) {
		harness.render(VNode::element("div").child(VNode::element("em")).child("after"));

		harness.render(VNode::element("div").child(VNode::element("strong")).child("after"));

		assert_eq!(harness.html(), "<div><strong></strong>after</div>");
		assert!(
			harness
				.take_ops()
				.iter()
				.any(|op| matches!(op, SurfaceOp::Replace { .. }))
		);
	}

	#[rstest]
	#[case(VNode::text("x"), VNode::element("i"), "<i></i>")]
	#[case(VNode::element("i"), VNode::fragment(["a", "b"]), "ab")]
	#[case(VNode::fragment(["a", "b"]), VNode::text("c"), "c")]
	#[case(VNode::void(), VNode::text("d"), "d")]
	fn test_kind_change_replaces(
		mut harness: Harness,
		#[case] first: VNode,
		#[case] second: VNode,
		#[case] expected: &str,
	) {
		harness.render(VNode::element("div").child(first).child(VNode::element("hr")));

		harness.render(VNode::element("div").child(second).child(VNode::element("hr")));

		assert_eq!(harness.html(), format!("<div>{expected}<hr></div>"));
	}

	#[rstest]
	fn test_function_noop_leaves_surface_untouched(mut harness: Harness) {
		// Arrange
		let updates = Rc::new(RefCell::new(0));
		let counter = updates.clone();
		let hooks = || {
			let counter = counter.clone();
			LifecycleHooks::new().on_did_update(move |_, _| *counter.borrow_mut() += 1)
		};
		harness.render(VNode::function(LABEL, Props::new().with("text", "a")).hooks(hooks()));
		harness.take_ops();

		// Act
		harness.render(VNode::function(LABEL, Props::new().with("text", "skip")).hooks(hooks()));

		// Assert
		assert!(harness.take_ops().is_empty());
		assert_eq!(harness.html(), "<span>a</span>");
		assert_eq!(*updates.borrow(), 0);
	}

	#[rstest]
	fn test_should_update_veto(mut harness: Harness) {
		let hooks = LifecycleHooks::new().on_should_update(|_, _| false);
		harness.render(VNode::function(LABEL, Props::new().with("text", "a")).hooks(hooks.clone()));

		harness.render(VNode::function(LABEL, Props::new().with("text", "b")).hooks(hooks));

		assert_eq!(harness.html(), "<span>a</span>");
	}

	#[rstest]
	fn test_function_type_swap_patches_previous_output(mut harness: Harness) {
		// Arrange
		let unmounted = Rc::new(RefCell::new(false));
		let flag = unmounted.clone();
		harness.render(
			VNode::function(LABEL, Props::new().with("text", "a"))
				.hooks(LifecycleHooks::new().on_will_unmount(move || *flag.borrow_mut() = true)),
		);
		let span = harness.reconciler.root(harness.container).unwrap().dom();

		// Act
		harness.render(VNode::function(HEADING, Props::new().with("text", "b")));

		// Assert
		assert_eq!(harness.html(), r#"<span class="heading">b</span>"#);
		assert_eq!(harness.reconciler.root(harness.container).unwrap().dom(), span);
		assert!(*unmounted.borrow());
	}
}
