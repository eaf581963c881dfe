//! Error types for the reconciler.
//!
//! Everything fallible in this crate returns [`ReconcileResult`]. Surface adapters
//! report their own failures through [`SurfaceError`], which converts into
//! [`ReconcileError::Surface`] at the `?` boundary.

use crate::surface::NodeHandle;
use thiserror::Error;

/// Failures reported by a [`Surface`](crate::surface::Surface) adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
	/// The handle does not name a node the adapter knows about
	#[error("Unknown surface handle: {0}")]
	UnknownHandle(NodeHandle),

	/// The adapter refused the operation (wrong node type, detached anchor, ...)
	#[error("Surface rejected {op}: {detail}")]
	Rejected {
		/// Name of the surface operation
		op: &'static str,
		/// Adapter supplied reason
		detail: String,
	},
}

impl SurfaceError {
	/// Shorthand for [`SurfaceError::Rejected`].
	pub fn rejected(op: &'static str, detail: impl Into<String>) -> Self {
		Self::Rejected {
			op,
			detail: detail.into(),
		}
	}
}

/// Misuse of the rendering API by the caller.
///
/// Depending on [`ContractMode`](crate::config::ContractMode) these are either logged
/// as warnings or returned as [`ReconcileError::ContractViolation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
	/// The container passed to `render` is the document root
	#[error(
		"rendering directly into the document root is not supported, render into a dedicated container element instead"
	)]
	RenderIntoDocumentRoot,

	/// An element or class component was given a lifecycle hook bag instead of a callback ref
	#[error("refs on <{target}> must be callbacks, lifecycle hooks are only valid on function components")]
	NonCallbackRef {
		/// Tag or component name carrying the ref
		target: String,
	},

	/// A function component was given a callback ref
	#[error("function component {component} cannot receive a callback ref, use lifecycle hooks instead")]
	FunctionComponentRef {
		/// Component name
		component: &'static str,
	},

	/// `dangerouslySetInnerHTML` was set to something other than a markup string
	#[error("dangerouslySetInnerHTML requires a markup string")]
	InnerHtmlWithoutContent,
}

/// Errors returned by reconciliation passes.
#[derive(Debug, Error)]
pub enum ReconcileError {
	/// The node cannot take part in the requested operation
	#[error("{operation} expects a mounted, well-formed node: {detail}")]
	InvalidNode {
		/// Operation that rejected the node
		operation: &'static str,
		/// What was wrong with it
		detail: String,
	},

	/// The caller broke an API contract and the reconciler runs in strict mode
	#[error("Contract violation: {0}")]
	ContractViolation(#[from] ContractViolation),

	/// The surface adapter failed
	#[error("Surface error: {0}")]
	Surface(#[from] SurfaceError),

	/// Options could not be parsed or are inconsistent
	#[error("Invalid reconciler options: {0}")]
	Config(String),
}

impl ReconcileError {
	pub(crate) fn invalid(operation: &'static str, detail: impl Into<String>) -> Self {
		Self::InvalidNode {
			operation,
			detail: detail.into(),
		}
	}

	pub(crate) fn unmounted(operation: &'static str) -> Self {
		Self::invalid(operation, "node has no surface handle, it was never mounted")
	}
}

/// Result type for reconciler operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for surface adapter operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;
