//! Property bags carried by elements and components.

use crate::surface::{Event, EventHandler};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// Names extracted from props before storage.
pub const RESERVED_PROPS: &[&str] = &["key", "ref", "children"];

/// A single inline style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
	/// Used verbatim
	Str(Cow<'static, str>),
	/// Gets a `px` suffix unless the property is unitless
	Number(f64),
}

impl From<&'static str> for StyleValue {
	fn from(value: &'static str) -> Self {
		Self::Str(Cow::Borrowed(value))
	}
}

impl From<String> for StyleValue {
	fn from(value: String) -> Self {
		Self::Str(Cow::Owned(value))
	}
}

impl From<f64> for StyleValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for StyleValue {
	fn from(value: i32) -> Self {
		Self::Number(f64::from(value))
	}
}

/// Ordered inline style map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
	entries: Vec<(Cow<'static, str>, StyleValue)>,
}

impl Style {
	/// Creates an empty style map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces a property.
	pub fn set(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<StyleValue>) -> Self {
		let name = name.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(key, _)| *key == name) {
			Some((_, current)) => *current = value,
			None => self.entries.push((name, value)),
		}
		self
	}

	/// Looks up a property.
	pub fn get(&self, name: &str) -> Option<&StyleValue> {
		self.entries
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value)
	}

	/// Iterates properties in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
		self.entries.iter().map(|(key, value)| (key.as_ref(), value))
	}

	/// Number of properties.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no property is set.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// A property value.
#[derive(Clone)]
pub enum PropValue {
	/// Absent value; removes the property when patched in
	Null,
	/// Boolean
	Bool(bool),
	/// Integer
	Int(i64),
	/// Floating point number
	Float(f64),
	/// String
	Str(Cow<'static, str>),
	/// Inline style map
	Style(Style),
	/// Event callback for `on*` props
	Handler(EventHandler),
	/// Arbitrary component data, compared by identity
	Data(Rc<dyn Any>),
}

impl PropValue {
	/// Wraps a closure as an event handler.
	pub fn handler(f: impl Fn(&Event) + 'static) -> Self {
		Self::Handler(Rc::new(f))
	}

	/// Wraps arbitrary data for component props.
	pub fn data<T: 'static>(value: T) -> Self {
		Self::Data(Rc::new(value))
	}

	/// Whether the value is [`PropValue::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// JavaScript-like truthiness, used for boolean properties.
	pub fn is_truthy(&self) -> bool {
		match self {
			Self::Null => false,
			Self::Bool(value) => *value,
			Self::Int(value) => *value != 0,
			Self::Float(value) => *value != 0.0 && !value.is_nan(),
			Self::Str(value) => !value.is_empty(),
			Self::Style(_) | Self::Handler(_) | Self::Data(_) => true,
		}
	}

	/// String form written to attributes and string properties.
	pub fn to_attribute_string(&self) -> String {
		match self {
			Self::Null => String::new(),
			Self::Bool(value) => value.to_string(),
			Self::Int(value) => value.to_string(),
			Self::Float(value) => value.to_string(),
			Self::Str(value) => value.to_string(),
			Self::Style(style) => style
				.iter()
				.map(|(name, value)| match value {
					StyleValue::Str(text) => format!("{name}: {text}"),
					StyleValue::Number(number) => format!("{name}: {number}"),
				})
				.collect::<Vec<_>>()
				.join("; "),
			Self::Handler(_) | Self::Data(_) => String::new(),
		}
	}

	/// Borrows the string content.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(value) => Some(value),
			_ => None,
		}
	}

	/// Downcasts [`PropValue::Data`].
	pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
		match self {
			Self::Data(value) => value.downcast_ref::<T>(),
			_ => None,
		}
	}
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Str(a), Self::Str(b)) => a == b,
			(Self::Style(a), Self::Style(b)) => a == b,
			(Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
			(Self::Data(a), Self::Data(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for PropValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => write!(f, "Null"),
			Self::Bool(value) => write!(f, "Bool({value})"),
			Self::Int(value) => write!(f, "Int({value})"),
			Self::Float(value) => write!(f, "Float({value})"),
			Self::Str(value) => write!(f, "Str({value:?})"),
			Self::Style(style) => f.debug_tuple("Style").field(style).finish(),
			Self::Handler(_) => write!(f, "Handler(..)"),
			Self::Data(_) => write!(f, "Data(..)"),
		}
	}
}

impl From<&'static str> for PropValue {
	fn from(value: &'static str) -> Self {
		Self::Str(Cow::Borrowed(value))
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Str(Cow::Owned(value))
	}
}

impl From<Cow<'static, str>> for PropValue {
	fn from(value: Cow<'static, str>) -> Self {
		Self::Str(value)
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i32> for PropValue {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<i64> for PropValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<u32> for PropValue {
	fn from(value: u32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<Style> for PropValue {
	fn from(value: Style) -> Self {
		Self::Style(value)
	}
}

impl From<EventHandler> for PropValue {
	fn from(value: EventHandler) -> Self {
		Self::Handler(value)
	}
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Ordered property bag.
///
/// Insertion order is kept so that surface mutations are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Props {
	entries: Vec<(Cow<'static, str>, PropValue)>,
}

impl Props {
	/// Creates an empty bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder form of [`Props::insert`].
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		self.insert(name, value);
		self
	}

	/// Adds or replaces a property, keeping the original position on replace.
	///
	/// Reserved names (`key`, `ref`, `children`) are ignored.
	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) {
		let name = name.into();
		if RESERVED_PROPS.contains(&name.as_ref()) {
			tracing::debug!(prop = %name, "reserved prop name ignored");
			return;
		}
		let value = value.into();
		match self.entries.iter_mut().find(|(key, _)| *key == name) {
			Some((_, current)) => *current = value,
			None => self.entries.push((name, value)),
		}
	}

	/// Looks up a property.
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.entries
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value)
	}

	/// Looks up a string property.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(PropValue::as_str)
	}

	/// Whether a property is present.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Removes a property.
	pub fn remove(&mut self, name: &str) -> Option<PropValue> {
		let index = self.entries.iter().position(|(key, _)| key == name)?;
		Some(self.entries.remove(index).1)
	}

	/// Fills in properties missing from `self` with those of `defaults`.
	pub fn merge_defaults(&mut self, defaults: &Props) {
		for (name, value) in &defaults.entries {
			if !self.contains(name) {
				self.entries.push((name.clone(), value.clone()));
			}
		}
	}

	/// Iterates properties in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.entries.iter().map(|(key, value)| (key.as_ref(), value))
	}

	/// Number of properties.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the bag is empty.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl PartialEq for Props {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len()
			&& self
				.iter()
				.all(|(name, value)| other.get(name) == Some(value))
	}
}

impl<K, V> FromIterator<(K, V)> for Props
where
	K: Into<Cow<'static, str>>,
	V: Into<PropValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut props = Self::new();
		for (name, value) in iter {
			props.insert(name, value);
		}
		props
	}
}
