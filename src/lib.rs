//! # Reinhardt VDOM
//!
//! Virtual tree rendering for Reinhardt frontends.
//!
//! This facade re-exports the reconciler engine. Build a tree of
//! [`VNode`](prelude::VNode)s, hand it to a [`Reconciler`](prelude::Reconciler)
//! together with a surface, and call `render` again whenever the tree changes.
//!
//! ## Feature Flags
//!
//! - `web` - browser DOM surface backed by `web-sys` (wasm32 only)
//!
//! ## Example
//!
//! ```
//! use reinhardt_vdom::prelude::*;
//!
//! let mut surface = MemorySurface::new();
//! let container = surface.create_container().unwrap();
//! let mut reconciler = Reconciler::new(surface);
//!
//! reconciler
//! 	.render(Some(VNode::element("h1").text_content("Hello")), container)
//! 	.unwrap();
//!
//! assert_eq!(reconciler.surface().inner_to_html(container), "<h1>Hello</h1>");
//! ```

pub use reinhardt_reconciler as reconciler;

pub use reinhardt_reconciler::{component, config, error, lifecycle, pool, surface, vnode};

/// Commonly used types.
pub mod prelude {
	pub use reinhardt_reconciler::prelude::*;
}
