//! Reconciler: keeps a surface in sync with successive virtual trees.
//!
//! [`Reconciler`] owns everything that survives a render pass: the surface adapter,
//! the root registry, the recycling pools, the instance to handle map and the
//! controlled input bindings. Each pass creates its own [`LifecycleQueue`] and drains
//! it before returning.
//!
//! ## Example
//!
//! ```
//! use reinhardt_reconciler::reconciler::Reconciler;
//! use reinhardt_reconciler::surface::MemorySurface;
//! use reinhardt_reconciler::vnode::VNode;
//!
//! let mut surface = MemorySurface::new();
//! let container = surface.create_container().unwrap();
//! let mut reconciler = Reconciler::new(surface);
//!
//! reconciler
//! 	.render(Some(VNode::element("p").text_content("one")), container)
//! 	.unwrap();
//! reconciler
//! 	.render(Some(VNode::element("p").text_content("two")), container)
//! 	.unwrap();
//!
//! assert_eq!(reconciler.surface().inner_to_html(container), "<p>two</p>");
//! ```
//!
//! The engine is split by concern:
//!
//! - `mount`: first materialization of a subtree
//! - `patch`: node level diff and replacement
//! - `children`: keyed and non-keyed child list diff
//! - `unmount`: teardown and pool return
//! - `hydrate`: attaching to server-rendered content
//! - `props` and `controlled`: element property application

mod children;
mod controlled;
mod hydrate;
mod lis;
mod mount;
mod patch;
mod props;
mod unmount;

pub use lis::longest_increasing_subsequence;
pub use props::{BOOLEAN_PROPS, STRICT_PROPS, UNITLESS_STYLES, prop_event_name, style_value};

use crate::component::{ComponentInstance, Context, InstanceId};
use crate::config::{ContractMode, ReconcilerOptions};
use crate::error::{ContractViolation, ReconcileResult};
use crate::lifecycle::LifecycleQueue;
use crate::pool::Pools;
use crate::surface::{InputBinding, NodeHandle, Surface};
use crate::vnode::{NodeKind, VNode};
use std::collections::HashMap;
use std::rc::Rc;

struct Root {
	container: NodeHandle,
	tree: VNode,
}

/// Reconciliation context bound to one surface.
pub struct Reconciler<S: Surface> {
	surface: S,
	options: ReconcilerOptions,
	pools: Pools,
	roots: Vec<Root>,
	instances: HashMap<InstanceId, NodeHandle>,
	bindings: HashMap<NodeHandle, Rc<InputBinding>>,
	/// Function will-mount hooks of the hydration in progress
	deferred_will_mount: Vec<Rc<dyn Fn()>>,
	/// Set while a failed hydration is mounted from its partial state
	rebuilding: bool,
}

impl<S: Surface> Reconciler<S> {
	/// Creates a reconciler with default options.
	pub fn new(surface: S) -> Self {
		Self::with_options(surface, ReconcilerOptions::default())
	}

	/// Creates a reconciler with the given options.
	pub fn with_options(surface: S, options: ReconcilerOptions) -> Self {
		Self {
			surface,
			pools: Pools::new(options.recycling),
			options,
			roots: Vec::new(),
			instances: HashMap::new(),
			bindings: HashMap::new(),
			deferred_will_mount: Vec::new(),
			rebuilding: false,
		}
	}

	/// The surface adapter.
	pub fn surface(&self) -> &S {
		&self.surface
	}

	/// Mutable access to the surface adapter, for simulating user input.
	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	/// Consumes the reconciler and returns its surface.
	pub fn into_surface(self) -> S {
		self.surface
	}

	pub fn options(&self) -> &ReconcilerOptions {
		&self.options
	}

	/// Recycling pools.
	pub fn pools(&self) -> &Pools {
		&self.pools
	}

	/// Permanently disables recycling and drops every pooled node.
	pub fn disable_recycling(&mut self) {
		self.pools.disable();
		self.options.recycling = false;
		tracing::debug!("recycling disabled");
	}

	/// Number of containers with a mounted tree.
	pub fn root_count(&self) -> usize {
		self.roots.len()
	}

	/// Whether a tree is mounted into `container`.
	pub fn has_root(&self, container: NodeHandle) -> bool {
		self.roots.iter().any(|root| root.container == container)
	}

	/// The tree currently mounted into `container`.
	pub fn root(&self, container: NodeHandle) -> Option<&VNode> {
		self.roots
			.iter()
			.find(|root| root.container == container)
			.map(|root| &root.tree)
	}

	/// Renders `tree` into `container`.
	///
	/// The first call for a container mounts (or hydrates), later calls patch the
	/// previous tree and `None` unmounts the tree and forgets the container.
	pub fn render(&mut self, tree: Option<VNode>, container: NodeHandle) -> ReconcileResult<()> {
		if self.surface.is_document_root(container) {
			self.report(ContractViolation::RenderIntoDocumentRoot)?;
		}
		let position = self
			.roots
			.iter()
			.position(|root| root.container == container);
		let mut queue = LifecycleQueue::new();

		match (position, tree) {
			(None, None) => {}
			(None, Some(mut tree)) => {
				tracing::debug!(%container, "mounting root");
				self.hydrate_or_mount(&mut tree, container, &mut queue)?;
				self.roots.push(Root { container, tree });
			}
			(Some(index), None) => {
				tracing::debug!(%container, "unmounting root");
				let root = self.roots.swap_remove(index);
				self.unmount(root.tree, Some(container), false)?;
			}
			(Some(index), Some(mut tree)) => {
				tracing::debug!(%container, "patching root");
				let root = self.roots.swap_remove(index);
				let context = Context::new();
				if let Err(err) =
					self.patch(root.tree, &mut tree, Some(container), &mut queue, &context, false)
				{
					// the next render starts from an empty container
					tracing::warn!(%container, %err, "patch failed, dropping root");
					self.release_abandoned(&mut tree)?;
					self.surface.clear_children(container)?;
					return Err(err);
				}
				self.roots.push(Root { container, tree });
			}
		}
		queue.trigger();
		Ok(())
	}

	/// Returns a renderer that remembers the container of its first call.
	pub fn create_renderer(&mut self) -> Renderer<'_, S> {
		Renderer {
			reconciler: self,
			container: None,
		}
	}

	/// Surface handle of the output of a mounted class component instance.
	pub fn find_instance_surface_handle(&self, instance: &ComponentInstance) -> Option<NodeHandle> {
		self.instances.get(&instance.id()).copied()
	}

	/// Logs or returns a contract violation depending on [`ContractMode`].
	pub(crate) fn report(&self, violation: ContractViolation) -> ReconcileResult<()> {
		match self.options.contract_mode {
			ContractMode::Warn => {
				tracing::warn!(%violation, "contract violation");
				Ok(())
			}
			ContractMode::Strict => Err(violation.into()),
		}
	}
}

/// Render function bound to a container, see [`Reconciler::create_renderer`].
pub struct Renderer<'a, S: Surface> {
	reconciler: &'a mut Reconciler<S>,
	container: Option<NodeHandle>,
}

impl<S: Surface> Renderer<'_, S> {
	/// Renders into the container of the first call. Later `container` arguments
	/// are ignored.
	pub fn render(&mut self, container: NodeHandle, tree: Option<VNode>) -> ReconcileResult<()> {
		let container = *self.container.get_or_insert(container);
		self.reconciler.render(tree, container)
	}

	/// Container fixed by the first call.
	pub fn container(&self) -> Option<NodeHandle> {
		self.container
	}
}

/// Collects every top level surface handle of a mounted node, in document order.
pub(crate) fn surface_handles(node: &VNode, out: &mut Vec<NodeHandle>) {
	match &node.kind {
		NodeKind::Fragment(fragment) => {
			for child in &fragment.children {
				surface_handles(child, out);
			}
			out.extend(node.dom);
		}
		NodeKind::Class(class) => {
			if let Some(instance) = &class.instance {
				instance.with_rendered(|rendered| {
					if let Some(rendered) = rendered {
						surface_handles(rendered, out);
					}
				});
			}
		}
		NodeKind::Function(function) => {
			if let Some(rendered) = &function.rendered {
				surface_handles(rendered, out);
			}
		}
		NodeKind::Text(_) | NodeKind::Void | NodeKind::Element(_) => out.extend(node.dom),
	}
}

/// First surface handle of a mounted node, used as an insertion anchor.
pub(crate) fn first_handle(node: &VNode) -> Option<NodeHandle> {
	match &node.kind {
		NodeKind::Fragment(fragment) => fragment
			.children
			.first()
			.and_then(first_handle)
			.or(node.dom),
		NodeKind::Class(class) => class
			.instance
			.as_ref()
			.and_then(|instance| instance.with_rendered(|rendered| rendered.and_then(first_handle))),
		NodeKind::Function(function) => function.rendered.as_deref().and_then(first_handle),
		NodeKind::Text(_) | NodeKind::Void | NodeKind::Element(_) => node.dom,
	}
}

fn collect_handles(node: &VNode) -> Vec<NodeHandle> {
	let mut handles = Vec::new();
	surface_handles(node, &mut handles);
	handles
}
