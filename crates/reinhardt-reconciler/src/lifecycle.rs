//! Pass scoped queue of deferred lifecycle callbacks.
//!
//! Mounting and patching push "did mount" style callbacks here instead of running
//! them immediately, so they observe a fully built surface. The caller that started
//! the pass drains the queue once, after the last surface mutation.

use std::fmt;

type Listener = Box<dyn FnOnce()>;

/// FIFO queue of callbacks collected during one render pass.
#[derive(Default)]
pub struct LifecycleQueue {
	listeners: Vec<Listener>,
}

impl LifecycleQueue {
	/// Creates an empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	/// Defers a callback until [`LifecycleQueue::trigger`].
	pub fn add_listener(&mut self, listener: impl FnOnce() + 'static) {
		self.listeners.push(Box::new(listener));
	}

	/// Moves every callback of `other` to the end of this queue.
	pub fn append(&mut self, other: &mut LifecycleQueue) {
		self.listeners.append(&mut other.listeners);
	}

	/// Number of pending callbacks.
	pub fn len(&self) -> usize {
		self.listeners.len()
	}

	/// Whether no callback is pending.
	pub fn is_empty(&self) -> bool {
		self.listeners.is_empty()
	}

	/// Runs every callback in insertion order.
	pub fn trigger(self) {
		let count = self.listeners.len();
		for listener in self.listeners {
			listener();
		}
		if count > 0 {
			tracing::trace!(count, "lifecycle callbacks triggered");
		}
	}
}

impl fmt::Debug for LifecycleQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LifecycleQueue")
			.field("pending", &self.listeners.len())
			.finish()
	}
}
