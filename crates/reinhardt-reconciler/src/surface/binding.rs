//! Events and controlled input bindings shared between the reconciler and adapters.

use super::NodeHandle;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Event delivered to `on*` handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	name: Cow<'static, str>,
	target: NodeHandle,
	value: Option<String>,
	checked: Option<bool>,
}

impl Event {
	/// Creates an event of the given name (`"click"`, `"input"`, ...) for a target node.
	pub fn new(name: impl Into<Cow<'static, str>>, target: NodeHandle) -> Self {
		Self {
			name: name.into(),
			target,
			value: None,
			checked: None,
		}
	}

	/// Records the value the user entered.
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	/// Records the checked state the user produced.
	pub fn with_checked(mut self, checked: bool) -> Self {
		self.checked = Some(checked);
		self
	}

	/// Event name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Node the event was dispatched on.
	pub fn target(&self) -> NodeHandle {
		self.target
	}

	/// Value captured from the target before a controlled value was re-applied.
	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	/// Checked state captured from the target before a controlled value was re-applied.
	pub fn checked(&self) -> Option<bool> {
		self.checked
	}
}

/// Shared event callback.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Value a controlled input is pinned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlledValue {
	/// Checkbox or radio `checked` state
	Checked(bool),
	/// Text-like `value`
	Value(String),
}

impl ControlledValue {
	/// Event that lets the user change this kind of value.
	pub fn event(&self) -> &'static str {
		match self {
			Self::Checked(_) => "click",
			Self::Value(_) => "input",
		}
	}
}

struct BindingState {
	value: ControlledValue,
	handler: Option<EventHandler>,
	group: Option<String>,
}

/// Keeps a surface input pinned to the value its props describe.
///
/// One binding exists per controlled node. The reconciler updates it on every patch
/// and the adapter consults it on every user interaction.
pub struct InputBinding {
	state: RefCell<BindingState>,
}

impl InputBinding {
	pub(crate) fn new(
		value: ControlledValue,
		handler: Option<EventHandler>,
		group: Option<String>,
	) -> Self {
		Self {
			state: RefCell::new(BindingState {
				value,
				handler,
				group,
			}),
		}
	}

	/// Event name this binding listens to.
	pub fn event(&self) -> &'static str {
		self.state.borrow().value.event()
	}

	/// Value the node must show.
	pub fn controlled_value(&self) -> ControlledValue {
		self.state.borrow().value.clone()
	}

	/// Radio group name, if any.
	pub fn group(&self) -> Option<String> {
		self.state.borrow().group.clone()
	}

	/// Whether the user's own handler is installed.
	pub fn has_handler(&self) -> bool {
		self.state.borrow().handler.is_some()
	}

	/// Calls the user's handler for the bound event.
	pub fn forward(&self, event: &Event) {
		let handler = self.state.borrow().handler.clone();
		if let Some(handler) = handler {
			handler(event);
		}
	}

	/// Replaces value, handler and group. Returns the previous value and group.
	pub(crate) fn update(
		&self,
		value: ControlledValue,
		handler: Option<EventHandler>,
		group: Option<String>,
	) -> (ControlledValue, Option<String>) {
		let mut state = self.state.borrow_mut();
		state.handler = handler;
		let previous_group = std::mem::replace(&mut state.group, group);
		let previous_value = std::mem::replace(&mut state.value, value);
		(previous_value, previous_group)
	}

	pub(crate) fn take_handler(&self) -> Option<EventHandler> {
		self.state.borrow_mut().handler.take()
	}
}

impl fmt::Debug for InputBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("InputBinding")
			.field("value", &state.value)
			.field("group", &state.group)
			.field("has_handler", &state.handler.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	#[case(ControlledValue::Checked(true), "click")]
	#[case(ControlledValue::Value("a".into()), "input")]
	fn test_binding_event(#[case] value: ControlledValue, #[case] expected: &str) {
		let binding = InputBinding::new(value, None, None);

		assert_eq!(binding.event(), expected);
	}

	#[rstest]
	fn test_forward_calls_current_handler() {
		// Arrange
		let calls = Rc::new(Cell::new(0));
		let seen = calls.clone();
		let binding = InputBinding::new(
			ControlledValue::Value("x".into()),
			Some(Rc::new(move |_: &Event| seen.set(seen.get() + 1))),
			None,
		);
		let event = Event::new("input", NodeHandle::from_raw(1)).with_value("xy");

		// Act
		binding.forward(&event);
		binding.update(ControlledValue::Value("xy".into()), None, None);
		binding.forward(&event);

		// Assert
		assert_eq!(calls.get(), 1);
		assert_eq!(binding.controlled_value(), ControlledValue::Value("xy".into()));
	}

	#[rstest]
	fn test_update_returns_previous_state() {
		let binding = InputBinding::new(ControlledValue::Checked(false), None, Some("size".into()));

		let (value, group) = binding.update(ControlledValue::Checked(true), None, Some("color".into()));

		assert_eq!(value, ControlledValue::Checked(false));
		assert_eq!(group.as_deref(), Some("size"));
		assert_eq!(binding.group().as_deref(), Some("color"));
	}
}
