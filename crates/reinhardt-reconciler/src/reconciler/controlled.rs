//! Controlled input bindings.
//!
//! An `<input>` or `<textarea>` whose props pin `value` (or `checked` for checkboxes
//! and radios) gets an [`InputBinding`]. The adapter re-applies the pinned value after
//! every user interaction, so the surface only changes when the props do.

use super::Reconciler;
use super::props::prop_event_name;
use crate::error::ReconcileResult;
use crate::surface::{ControlledValue, EventHandler, InputBinding, NodeHandle, Surface};
use crate::vnode::{PropValue, Props};
use std::rc::Rc;

fn input_type(props: &Props) -> Option<String> {
	props.get_str("type").map(str::to_ascii_lowercase)
}

/// Value the props pin, `None` for an uncontrolled input.
pub(crate) fn controlled_value(props: &Props) -> Option<ControlledValue> {
	let present = |name: &str| props.get(name).filter(|value| !value.is_null());
	match input_type(props).as_deref() {
		Some("checkbox" | "radio") => {
			present("checked").map(|checked| ControlledValue::Checked(checked.is_truthy()))
		}
		_ => present("value").map(|value| ControlledValue::Value(value.to_attribute_string())),
	}
}

fn radio_group(props: &Props) -> Option<String> {
	if input_type(props).as_deref() != Some("radio") {
		return None;
	}
	props
		.get("name")
		.filter(|name| !name.is_null())
		.map(PropValue::to_attribute_string)
}

fn user_handler(props: &Props, event: &str) -> Option<EventHandler> {
	props.iter().find_map(|(name, value)| match value {
		PropValue::Handler(handler) if prop_event_name(name).as_deref() == Some(event) => {
			Some(handler.clone())
		}
		_ => None,
	})
}

impl<S: Surface> Reconciler<S> {
	/// Binds a freshly created input when its props pin a value.
	pub(crate) fn attach_binding(&mut self, dom: NodeHandle, props: &Props) -> ReconcileResult<()> {
		let Some(value) = controlled_value(props) else {
			return Ok(());
		};
		let event = value.event();
		let binding = Rc::new(InputBinding::new(
			value,
			user_handler(props, event),
			radio_group(props),
		));
		self.surface.bind_controlled(dom, Some(binding.clone()))?;
		self.bindings.insert(dom, binding.clone());
		self.push_controlled(dom, &binding)
	}

	/// Brings the binding of a patched input in line with its new props.
	pub(crate) fn validate_binding(&mut self, dom: NodeHandle, props: &Props) -> ReconcileResult<()> {
		let existing = self.bindings.get(&dom).cloned();
		let Some(value) = controlled_value(props) else {
			if let Some(binding) = existing {
				let event = binding.event();
				self.release_binding(dom)?;
				if let Some(handler) = user_handler(props, event) {
					self.surface.set_event_listener(dom, event, Some(handler))?;
				}
			}
			return Ok(());
		};

		let Some(binding) = existing else {
			// the handler moves from a plain listener into the binding
			if user_handler(props, value.event()).is_some() {
				self.surface.set_event_listener(dom, value.event(), None)?;
			}
			return self.attach_binding(dom, props);
		};

		let event = value.event();
		let previous_event = binding.event();
		let group = radio_group(props);
		let (previous_value, previous_group) =
			binding.update(value.clone(), user_handler(props, event), group.clone());

		if previous_event != event {
			self.surface.bind_controlled(dom, Some(binding.clone()))?;
			if let Some(handler) = user_handler(props, previous_event) {
				self.surface
					.set_event_listener(dom, previous_event, Some(handler))?;
			}
			if user_handler(props, event).is_some() {
				self.surface.set_event_listener(dom, event, None)?;
			}
		}
		if previous_value != value {
			self.push_controlled(dom, &binding)?;
		}
		if previous_value != value || previous_group != group {
			if let Some(previous_group) = &previous_group
				&& group.as_ref() != Some(previous_group)
			{
				self.revalidate_group(previous_group, dom)?;
			}
			if let Some(group) = &group {
				self.revalidate_group(group, dom)?;
			}
		}
		Ok(())
	}

	/// Drops the binding of a node, if any.
	pub(crate) fn release_binding(&mut self, dom: NodeHandle) -> ReconcileResult<()> {
		if self.bindings.remove(&dom).is_some() {
			self.surface.bind_controlled(dom, None)?;
		}
		Ok(())
	}

	fn push_controlled(&mut self, dom: NodeHandle, binding: &InputBinding) -> ReconcileResult<()> {
		match binding.controlled_value() {
			ControlledValue::Checked(checked) => {
				self.surface.set_bool_property(dom, "checked", checked)?
			}
			ControlledValue::Value(value) => self.surface.set_value_property(dom, "value", &value)?,
		}
		Ok(())
	}

	/// Re-applies the pinned value of every other bound member of a radio group.
	fn revalidate_group(&mut self, group: &str, except: NodeHandle) -> ReconcileResult<()> {
		let mut peers: Vec<(NodeHandle, Rc<InputBinding>)> = self
			.bindings
			.iter()
			.filter(|(handle, binding)| {
				**handle != except && binding.group().as_deref() == Some(group)
			})
			.map(|(handle, binding)| (*handle, binding.clone()))
			.collect();
		peers.sort_by_key(|(handle, _)| *handle);
		for (peer, binding) in peers {
			self.push_controlled(peer, &binding)?;
		}
		Ok(())
	}
}
