//! Class components.
//!
//! A class component is a type implementing [`Component`]. The reconciler creates one
//! instance per mounted node and keeps it across patches as long as the node's type
//! stays the same. Instances are reachable from callback refs and from
//! [`VNode::instance`](crate::vnode::VNode::instance) as a [`ComponentInstance`].

use super::{ComponentType, Context, Render};
use crate::vnode::{Props, VNode};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique id of a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
	fn next() -> Self {
		Self(INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

/// A stateful component.
///
/// ```
/// use reinhardt_reconciler::component::{Component, Context, Render};
/// use reinhardt_reconciler::vnode::{Props, VNode};
///
/// struct Counter {
/// 	clicks: u32,
/// }
///
/// impl Component for Counter {
/// 	type State = u32;
///
/// 	fn create(_props: &Props, _context: &Context) -> Self {
/// 		Self { clicks: 0 }
/// 	}
///
/// 	fn state(&self) -> &u32 {
/// 		&self.clicks
/// 	}
///
/// 	fn render(&mut self, props: &Props, _context: &Context) -> Render {
/// 		let label = props.get_str("label").unwrap_or("Clicks");
/// 		VNode::element("span")
/// 			.text_content(format!("{label}: {}", self.clicks))
/// 			.into()
/// 	}
///
/// 	fn name() -> &'static str {
/// 		"Counter"
/// 	}
/// }
/// ```
pub trait Component: 'static {
	/// Snapshot type handed to [`Component::component_did_update`].
	type State: Clone + 'static;

	/// Builds the instance for the initial props and inherited context.
	fn create(props: &Props, context: &Context) -> Self
	where
		Self: Sized;

	/// Current state.
	fn state(&self) -> &Self::State;

	/// Produces the output for the current props.
	fn render(&mut self, props: &Props, context: &Context) -> Render;

	/// Component name for diagnostics.
	fn name() -> &'static str
	where
		Self: Sized;

	/// Props filled in when the caller leaves them out.
	fn default_props() -> Option<Props>
	where
		Self: Sized,
	{
		None
	}

	/// Context contributed to this component's subtree.
	fn child_context(&self) -> Option<Context> {
		None
	}

	/// Called before the first render.
	fn component_will_mount(&mut self) {}

	/// Called once the mount pass completes.
	fn component_did_mount(&mut self) {}

	/// Called when the parent re-renders with new props.
	fn component_will_receive_props(&mut self, _next_props: &Props, _context: &Context) {}

	/// Decides whether new props re-render the component.
	fn should_component_update(&self, _next_props: &Props) -> bool {
		true
	}

	/// Called before re-rendering.
	fn component_will_update(&mut self, _next_props: &Props) {}

	/// Called after the new output is patched in.
	fn component_did_update(&mut self, _prev_props: &Props, _prev_state: &Self::State) {}

	/// Called before the component's output is torn down.
	fn component_will_unmount(&mut self) {}
}

pub(crate) trait AnyComponent {
	fn as_any_mut(&mut self) -> &mut dyn Any;
	fn state_snapshot(&self) -> Box<dyn Any>;
	fn render(&mut self, props: &Props, context: &Context) -> Render;
	fn child_context(&self) -> Option<Context>;
	fn will_mount(&mut self);
	fn did_mount(&mut self);
	fn will_receive_props(&mut self, next_props: &Props, context: &Context);
	fn should_update(&self, next_props: &Props) -> bool;
	fn will_update(&mut self, next_props: &Props);
	fn did_update(&mut self, prev_props: &Props, prev_state: &dyn Any);
	fn will_unmount(&mut self);
}

impl<C: Component> AnyComponent for C {
	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}

	fn state_snapshot(&self) -> Box<dyn Any> {
		Box::new(self.state().clone())
	}

	fn render(&mut self, props: &Props, context: &Context) -> Render {
		Component::render(self, props, context)
	}

	fn child_context(&self) -> Option<Context> {
		Component::child_context(self)
	}

	fn will_mount(&mut self) {
		self.component_will_mount();
	}

	fn did_mount(&mut self) {
		self.component_did_mount();
	}

	fn will_receive_props(&mut self, next_props: &Props, context: &Context) {
		self.component_will_receive_props(next_props, context);
	}

	fn should_update(&self, next_props: &Props) -> bool {
		self.should_component_update(next_props)
	}

	fn will_update(&mut self, next_props: &Props) {
		self.component_will_update(next_props);
	}

	fn did_update(&mut self, prev_props: &Props, prev_state: &dyn Any) {
		if let Some(prev_state) = prev_state.downcast_ref::<C::State>() {
			self.component_did_update(prev_props, prev_state);
		}
	}

	fn will_unmount(&mut self) {
		self.component_will_unmount();
	}
}

fn create_erased<C: Component>(props: &Props, context: &Context) -> Box<dyn AnyComponent> {
	Box::new(C::create(props, context))
}

/// Type descriptor of a class component.
#[derive(Clone, Copy)]
pub struct ClassComponent {
	type_id: TypeId,
	name: &'static str,
	create: fn(&Props, &Context) -> Box<dyn AnyComponent>,
	default_props: fn() -> Option<Props>,
}

impl ClassComponent {
	/// Descriptor for `C`.
	pub fn of<C: Component>() -> Self {
		Self {
			type_id: TypeId::of::<C>(),
			name: C::name(),
			create: create_erased::<C>,
			default_props: C::default_props,
		}
	}

	/// Component name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn default_props(&self) -> Option<Props> {
		(self.default_props)()
	}

	pub(crate) fn component_type(&self) -> ComponentType {
		ComponentType::Class(self.type_id)
	}
}

impl PartialEq for ClassComponent {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}

impl fmt::Debug for ClassComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ClassComponent").field(&self.name).finish()
	}
}

struct InstanceState {
	id: InstanceId,
	name: &'static str,
	component: Box<dyn AnyComponent>,
	props: Props,
	child_context: Context,
	last_rendered: Option<Box<VNode>>,
	unmounted: bool,
	pending_update: bool,
}

/// Result of [`ComponentInstance::update`].
pub(crate) struct ClassUpdate {
	/// New output, `None` when the component skipped the update
	pub(crate) output: Option<VNode>,
	pub(crate) prev_props: Props,
	pub(crate) prev_state: Box<dyn Any>,
}

/// Shared handle to a class component instance.
#[derive(Clone)]
pub struct ComponentInstance {
	inner: Rc<RefCell<InstanceState>>,
}

impl ComponentInstance {
	/// Creates the instance, runs `component_will_mount` and the first render.
	pub(crate) fn create(
		descriptor: &ClassComponent,
		props: Props,
		context: &Context,
	) -> (Self, VNode) {
		let mut component = (descriptor.create)(&props, context);
		let child_context = match component.child_context() {
			Some(own) => context.merge(&own),
			None => context.clone(),
		};
		component.will_mount();
		let output = component
			.render(&props, &child_context)
			.into_node()
			.unwrap_or_else(VNode::void);
		let instance = Self {
			inner: Rc::new(RefCell::new(InstanceState {
				id: InstanceId::next(),
				name: descriptor.name(),
				component,
				props,
				child_context,
				last_rendered: None,
				unmounted: false,
				pending_update: false,
			})),
		};
		(instance, output)
	}

	/// Unique id.
	pub fn id(&self) -> InstanceId {
		self.inner.borrow().id
	}

	/// Component name.
	pub fn name(&self) -> &'static str {
		self.inner.borrow().name
	}

	/// Props of the last update.
	pub fn props(&self) -> Props {
		self.inner.borrow().props.clone()
	}

	/// Whether the instance was torn down.
	pub fn is_unmounted(&self) -> bool {
		self.inner.borrow().unmounted
	}

	/// Whether an update is in progress.
	pub fn is_updating(&self) -> bool {
		self.inner.borrow().pending_update
	}

	/// Whether two handles point at the same instance.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// Runs `f` against the concrete component, if it is a `C`.
	///
	/// Must not be called from inside the component's own lifecycle methods.
	pub fn with<C: Component, R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
		let mut state = self.inner.borrow_mut();
		state.component.as_any_mut().downcast_mut::<C>().map(f)
	}

	pub(crate) fn child_context(&self) -> Context {
		self.inner.borrow().child_context.clone()
	}

	pub(crate) fn take_rendered(&self) -> Option<Box<VNode>> {
		self.inner.borrow_mut().last_rendered.take()
	}

	pub(crate) fn set_rendered(&self, node: Box<VNode>) {
		self.inner.borrow_mut().last_rendered = Some(node);
	}

	/// Runs `f` against the last rendered output.
	pub(crate) fn with_rendered<R>(&self, f: impl FnOnce(Option<&VNode>) -> R) -> R {
		let state = self.inner.borrow();
		f(state.last_rendered.as_deref())
	}

	/// Mutable access to the last rendered output.
	pub(crate) fn with_rendered_mut<R>(&self, f: impl FnOnce(Option<&mut VNode>) -> R) -> R {
		let mut state = self.inner.borrow_mut();
		f(state.last_rendered.as_deref_mut())
	}

	pub(crate) fn did_mount(&self) {
		self.inner.borrow_mut().component.did_mount();
	}

	/// Runs the update sequence: will-receive-props, should-update, will-update,
	/// render. Props are stored even when the update is skipped.
	pub(crate) fn update(&self, next_props: Props, context: &Context) -> ClassUpdate {
		let mut guard = self.inner.borrow_mut();
		let state = &mut *guard;
		if state.props != next_props {
			state.component.will_receive_props(&next_props, context);
		}
		let prev_state = state.component.state_snapshot();
		let should_update = state.component.should_update(&next_props);
		if should_update {
			state.component.will_update(&next_props);
		}
		let prev_props = std::mem::replace(&mut state.props, next_props);
		state.child_context = match state.component.child_context() {
			Some(own) => context.merge(&own),
			None => context.clone(),
		};
		if !should_update {
			return ClassUpdate {
				output: None,
				prev_props,
				prev_state,
			};
		}

		state.pending_update = true;
		let output = state
			.component
			.render(&state.props, &state.child_context)
			.into_node();
		state.pending_update = false;
		ClassUpdate {
			output,
			prev_props,
			prev_state,
		}
	}

	pub(crate) fn did_update(&self, prev_props: &Props, prev_state: &dyn Any) {
		self.inner
			.borrow_mut()
			.component
			.did_update(prev_props, prev_state);
	}

	/// Runs `component_will_unmount` once and flags the instance. Returns whether
	/// this call performed the teardown.
	pub(crate) fn unmount(&self) -> bool {
		let mut state = self.inner.borrow_mut();
		if state.unmounted {
			return false;
		}
		state.component.will_unmount();
		state.unmounted = true;
		true
	}
}

impl fmt::Debug for ComponentInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.inner.try_borrow() {
			Ok(state) => f
				.debug_struct("ComponentInstance")
				.field("id", &state.id)
				.field("name", &state.name)
				.field("unmounted", &state.unmounted)
				.finish(),
			Err(_) => f.write_str("ComponentInstance(<in use>)"),
		}
	}
}
