//! Function components and their lifecycle hooks.

use super::{ComponentType, Context, Render};
use crate::surface::NodeHandle;
use crate::vnode::Props;
use std::fmt;
use std::rc::Rc;

/// Render function of a function component.
pub type RenderFn = fn(&Props, &Context) -> Render;

/// A stateless component: a named render function.
///
/// Two function components are the same type when they wrap the same function.
///
/// ```
/// use reinhardt_reconciler::component::{Context, FunctionComponent, Render};
/// use reinhardt_reconciler::vnode::{Props, VNode};
///
/// fn greeting(props: &Props, _: &Context) -> Render {
/// 	let name = props.get_str("name").unwrap_or("world");
/// 	VNode::element("p").text_content(format!("Hello, {name}!")).into()
/// }
///
/// const GREETING: FunctionComponent = FunctionComponent::new("Greeting", greeting);
/// assert_eq!(GREETING.name(), "Greeting");
/// ```
#[derive(Clone, Copy)]
pub struct FunctionComponent {
	name: &'static str,
	render: RenderFn,
}

impl FunctionComponent {
	/// Wraps a render function.
	pub const fn new(name: &'static str, render: RenderFn) -> Self {
		Self { name, render }
	}

	/// Display name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn call(&self, props: &Props, context: &Context) -> Render {
		(self.render)(props, context)
	}

	/// Recycling pool key.
	pub fn component_type(&self) -> ComponentType {
		ComponentType::Function(self.render as usize)
	}
}

impl PartialEq for FunctionComponent {
	fn eq(&self, other: &Self) -> bool {
		self.component_type() == other.component_type()
	}
}

impl fmt::Debug for FunctionComponent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FunctionComponent").field(&self.name).finish()
	}
}

type Hook = Rc<dyn Fn()>;
type MountHook = Rc<dyn Fn(NodeHandle)>;
type PropsHook = Rc<dyn Fn(&Props, &Props)>;
type ShouldUpdateHook = Rc<dyn Fn(&Props, &Props) -> bool>;

/// Lifecycle callbacks for a function component, supplied through its ref slot.
///
/// Props hooks receive `(previous, next)`.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
	pub(crate) will_mount: Option<Hook>,
	pub(crate) did_mount: Option<MountHook>,
	pub(crate) should_update: Option<ShouldUpdateHook>,
	pub(crate) will_update: Option<PropsHook>,
	pub(crate) did_update: Option<PropsHook>,
	pub(crate) will_unmount: Option<Hook>,
}

impl LifecycleHooks {
	/// Creates an empty hook bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Called right after the rendered output is mounted.
	pub fn on_will_mount(mut self, hook: impl Fn() + 'static) -> Self {
		self.will_mount = Some(Rc::new(hook));
		self
	}

	/// Called once the mount pass completes, with the output's surface handle.
	pub fn on_did_mount(mut self, hook: impl Fn(NodeHandle) + 'static) -> Self {
		self.did_mount = Some(Rc::new(hook));
		self
	}

	/// Decides whether new props re-render the component.
	pub fn on_should_update(mut self, hook: impl Fn(&Props, &Props) -> bool + 'static) -> Self {
		self.should_update = Some(Rc::new(hook));
		self
	}

	/// Called before re-rendering.
	pub fn on_will_update(mut self, hook: impl Fn(&Props, &Props) + 'static) -> Self {
		self.will_update = Some(Rc::new(hook));
		self
	}

	/// Called after the new output is patched in.
	pub fn on_did_update(mut self, hook: impl Fn(&Props, &Props) + 'static) -> Self {
		self.did_update = Some(Rc::new(hook));
		self
	}

	/// Called before the component's output is torn down.
	pub fn on_will_unmount(mut self, hook: impl Fn() + 'static) -> Self {
		self.will_unmount = Some(Rc::new(hook));
		self
	}

	/// Nodes carrying mount, update or unmount hooks are never recycled, since reuse
	/// would skip callbacks their owner relies on.
	pub(crate) fn blocks_recycling(&self) -> bool {
		self.will_mount.is_some()
			|| self.did_mount.is_some()
			|| self.will_update.is_some()
			|| self.did_update.is_some()
			|| self.will_unmount.is_some()
	}

	pub(crate) fn should_update(&self, previous: &Props, next: &Props) -> bool {
		self.should_update
			.as_ref()
			.is_none_or(|hook| hook(previous, next))
	}
}

impl fmt::Debug for LifecycleHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LifecycleHooks")
			.field("will_mount", &self.will_mount.is_some())
			.field("did_mount", &self.did_mount.is_some())
			.field("should_update", &self.should_update.is_some())
			.field("will_update", &self.will_update.is_some())
			.field("did_update", &self.did_update.is_some())
			.field("will_unmount", &self.will_unmount.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::vnode::VNode;
	use rstest::rstest;

	fn first(_: &Props, _: &Context) -> Render {
		Render::Empty
	}

	fn second(_: &Props, _: &Context) -> Render {
		Render::Node(VNode::text("second"))
	}

	#[rstest]
	fn test_identity_follows_the_function() {
		let a = FunctionComponent::new("A", first);
		let b = FunctionComponent::new("B", first);
		let c = FunctionComponent::new("C", second);

		assert_eq!(a, b);
		assert_ne!(a, c);
	}

	#[rstest]
	#[case(LifecycleHooks::new(), false)]
	#[case(LifecycleHooks::new().on_should_update(|_, _| false), false)]
	#[case(LifecycleHooks::new().on_will_mount(|| {}), true)]
	#[case(LifecycleHooks::new().on_did_update(|_, _| {}), true)]
	#[case(LifecycleHooks::new().on_will_unmount(|| {}), true)]
	fn test_blocks_recycling(#[case] hooks: LifecycleHooks, #[case] expected: bool) {
		assert_eq!(hooks.blocks_recycling(), expected);
	}

	#[rstest]
	fn test_should_update_defaults_to_true() {
		let props = Props::new();

		assert!(LifecycleHooks::new().should_update(&props, &props));
		assert!(
			!LifecycleHooks::new()
				.on_should_update(|_, _| false)
				.should_update(&props, &props)
		);
	}
}
