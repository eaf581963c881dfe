//! Component model.
//!
//! Two kinds of components exist:
//!
//! - **Class components** implement [`Component`]. They own state, receive the full
//!   set of lifecycle methods and are exposed to callback refs as a
//!   [`ComponentInstance`].
//! - **Function components** are a [`FunctionComponent`]: a named
//!   `fn(&Props, &Context) -> Render`. Their lifecycle is observed through a
//!   [`LifecycleHooks`] bag placed in the node's ref slot.
//!
//! Both render into a [`Render`] value. Returning [`Render::NoOp`] from an update
//! keeps the previous output untouched.

mod class;
mod context;
mod function;
mod render;

pub use class::{ClassComponent, Component, ComponentInstance, InstanceId};
pub use context::Context;
pub use function::{FunctionComponent, LifecycleHooks, RenderFn};
pub use render::Render;

use std::any::TypeId;

/// Identity used to decide whether two component nodes are the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
	/// Class component, by Rust type
	Class(TypeId),
	/// Function component, by render function address
	Function(usize),
}

impl ComponentType {
	/// Whether this is a class component type.
	pub fn is_class(self) -> bool {
		matches!(self, Self::Class(_))
	}
}
