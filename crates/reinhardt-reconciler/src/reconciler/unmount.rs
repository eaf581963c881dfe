//! Unmounting.

use super::{Reconciler, collect_handles};
use crate::error::ReconcileResult;
use crate::surface::{NodeHandle, Surface};
use crate::vnode::{Children, NodeKind, NodeRef, VNode};

fn release_ref(node_ref: Option<&NodeRef>) {
	if let Some(NodeRef::Callback(callback)) = node_ref {
		callback(None);
	}
}

impl<S: Surface> Reconciler<S> {
	/// Tears `node` down and, when `parent` is given, detaches its surface nodes.
	///
	/// The node is offered to the recycling pools when it was detached here or the
	/// caller allows recycling of an already detached subtree.
	pub fn unmount(
		&mut self,
		mut node: VNode,
		parent: Option<NodeHandle>,
		can_recycle: bool,
	) -> ReconcileResult<()> {
		self.teardown(&mut node)?;
		if let Some(parent) = parent {
			for handle in collect_handles(&node) {
				self.surface.remove_child(parent, handle)?;
			}
		}
		if self.pools.is_enabled() && (parent.is_some() || can_recycle) && self.pools.put(node) {
			tracing::trace!("unmounted node parked for recycling");
		}
		Ok(())
	}

	/// Runs unmount callbacks through the subtree without touching the surface.
	pub(crate) fn teardown(&mut self, node: &mut VNode) -> ReconcileResult<()> {
		match &mut node.kind {
			NodeKind::Text(_) | NodeKind::Void => {}
			NodeKind::Element(element) => {
				release_ref(element.node_ref.as_ref());
				match &mut element.children {
					Children::Single(child) => self.teardown(child)?,
					Children::Many(list) => {
						for child in list {
							self.teardown(child)?;
						}
					}
					Children::None | Children::Text(_) => {}
				}
				if let Some(dom) = node.dom {
					self.release_binding(dom)?;
				}
			}
			NodeKind::Fragment(fragment) => {
				for child in &mut fragment.children {
					self.teardown(child)?;
				}
			}
			NodeKind::Class(class) => {
				let Some(instance) = class.instance.clone() else {
					return Ok(());
				};
				if instance.is_unmounted() {
					return Ok(());
				}
				release_ref(class.node_ref.as_ref());
				instance.unmount();
				self.instances.remove(&instance.id());
				if let Some(mut rendered) = instance.take_rendered() {
					self.teardown(&mut rendered)?;
					instance.set_rendered(rendered);
				}
			}
			NodeKind::Function(function) => {
				if let Some(rendered) = &mut function.rendered {
					self.teardown(rendered)?;
				}
				if let Some(hook) = function.hooks().and_then(|hooks| hooks.will_unmount.clone()) {
					hook();
				}
			}
		}
		Ok(())
	}
}
