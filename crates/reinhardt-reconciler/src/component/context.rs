//! Context values passed down the component tree.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Immutable string keyed map of values inherited by every descendant.
///
/// Class components may contribute values for their subtree through
/// [`Component::child_context`](crate::component::Component::child_context); they are
/// merged over the inherited context, with the child's entries winning.
#[derive(Clone, Default)]
pub struct Context {
	values: Rc<HashMap<Cow<'static, str>, Rc<dyn Any>>>,
}

impl Context {
	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy with one more entry.
	pub fn with<T: 'static>(&self, key: impl Into<Cow<'static, str>>, value: T) -> Self {
		let mut values = (*self.values).clone();
		values.insert(key.into(), Rc::new(value));
		Self {
			values: Rc::new(values),
		}
	}

	/// Looks up an entry of type `T`.
	pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
		self.values.get(key)?.downcast_ref::<T>()
	}

	/// Whether an entry exists regardless of its type.
	pub fn contains(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	/// Merges `child` over `self`.
	pub fn merge(&self, child: &Context) -> Self {
		if child.is_empty() {
			return self.clone();
		}
		if self.is_empty() {
			return child.clone();
		}
		let mut values = (*self.values).clone();
		for (key, value) in child.values.iter() {
			values.insert(key.clone(), value.clone());
		}
		Self {
			values: Rc::new(values),
		}
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Whether the context is empty.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

impl fmt::Debug for Context {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<&str> = self.values.keys().map(|key| key.as_ref()).collect();
		keys.sort_unstable();
		f.debug_struct("Context").field("keys", &keys).finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_child_entries_override_parent() {
		// Arrange
		let parent = Context::new().with("theme", "light").with("locale", "en");
		let child = Context::new().with("theme", "dark");

		// Act
		let merged = parent.merge(&child);

		// Assert
		assert_eq!(merged.get::<&str>("theme"), Some(&"dark"));
		assert_eq!(merged.get::<&str>("locale"), Some(&"en"));
		assert_eq!(parent.get::<&str>("theme"), Some(&"light"));
	}

	#[rstest]
	fn test_wrong_type_is_none() {
		let context = Context::new().with("count", 3u32);

		assert_eq!(context.get::<u32>("count"), Some(&3));
		assert_eq!(context.get::<i64>("count"), None);
		assert!(context.contains("count"));
	}
}
