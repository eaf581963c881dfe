//! Reinhardt Reconciler - virtual tree engine for Reinhardt frontends
//!
//! Renders a declarative tree of [`VNode`](vnode::VNode)s onto a retained-mode
//! [`Surface`](surface::Surface) and keeps the surface in sync as the tree changes,
//! issuing the smallest set of mutations it can find.
//!
//! ## Features
//!
//! - **Mount / patch / unmount**: recursive diff across text, void, element, fragment
//!   and component nodes
//! - **Keyed children**: prefix and suffix trimming plus longest increasing subsequence
//!   placement, so only children off the longest ordered run are moved
//! - **Components**: stateful class components with the full lifecycle and stateless
//!   function components with hook bags
//! - **Recycling**: optional pools of unmounted elements and components
//! - **Hydration**: adopts server-rendered content and rebuilds the root on mismatch
//! - **Controlled inputs**: `value` / `checked` props pinned against user edits
//!
//! ## Architecture
//!
//! - [`vnode`]: node model, props, children normalization
//! - [`component`]: component contracts, instances, context
//! - [`surface`]: adapter trait, [`MemorySurface`](surface::MemorySurface) and the
//!   browser adapter behind the `web` feature
//! - [`reconciler`]: the engine and its render entry points
//! - [`lifecycle`]: per-pass callback queue
//! - [`pool`]: recycling pools
//! - [`config`]: reconciler options
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```
//! use reinhardt_reconciler::prelude::*;
//!
//! let mut surface = MemorySurface::new();
//! let container = surface.create_container().unwrap();
//! let mut reconciler = Reconciler::new(surface);
//!
//! let list = |items: &[&'static str]| {
//! 	VNode::element("ul").children(
//! 		items
//! 			.iter()
//! 			.map(|item| VNode::element("li").key(*item).text_content(*item)),
//! 	)
//! };
//!
//! reconciler.render(Some(list(&["a", "b", "c"])), container).unwrap();
//! reconciler.render(Some(list(&["c", "a", "b"])), container).unwrap();
//!
//! assert_eq!(
//! 	reconciler.surface().inner_to_html(container),
//! 	"<ul><li>c</li><li>a</li><li>b</li></ul>"
//! );
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pool;
pub mod reconciler;
pub mod surface;
pub mod vnode;

/// Commonly used types.
pub mod prelude {
	pub use crate::component::{
		Component, ComponentInstance, Context, FunctionComponent, LifecycleHooks, Render,
	};
	pub use crate::config::{ContractMode, ReconcilerOptions};
	pub use crate::error::{ContractViolation, ReconcileError, ReconcileResult, SurfaceError};
	pub use crate::lifecycle::LifecycleQueue;
	pub use crate::reconciler::{Reconciler, Renderer};
	pub use crate::surface::{Event, MemorySurface, NodeHandle, Surface, SurfaceOp};
	pub use crate::vnode::{Key, NodeRef, PropValue, Props, RefTarget, Style, VNode};
}
