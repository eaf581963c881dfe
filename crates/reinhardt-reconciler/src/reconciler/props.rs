//! Property application.

use super::Reconciler;
use crate::error::{ContractViolation, ReconcileResult};
use crate::surface::{NodeHandle, Surface, XLINK_NAMESPACE, XML_NAMESPACE};
use crate::vnode::{PropValue, Props, Style, StyleValue};

/// Written as DOM boolean properties instead of attributes.
pub const BOOLEAN_PROPS: &[&str] = &[
	"muted",
	"scoped",
	"loop",
	"open",
	"checked",
	"default",
	"capture",
	"disabled",
	"selected",
	"readonly",
	"multiple",
	"required",
	"autoplay",
	"controls",
	"seamless",
	"reversed",
	"allowfullscreen",
	"novalidate",
];

/// Written as string properties, compared against the current value first.
pub const STRICT_PROPS: &[&str] = &["volume", "value", "defaultValue", "defaultChecked"];

/// Numeric style properties that do not take a `px` suffix.
pub const UNITLESS_STYLES: &[&str] = &[
	"animationIterationCount",
	"borderImageOutset",
	"borderImageSlice",
	"borderImageWidth",
	"boxFlex",
	"boxFlexGroup",
	"boxOrdinalGroup",
	"columnCount",
	"flex",
	"flexGrow",
	"flexPositive",
	"flexShrink",
	"flexNegative",
	"flexOrder",
	"gridRow",
	"gridColumn",
	"fontWeight",
	"lineClamp",
	"lineHeight",
	"opacity",
	"order",
	"orphans",
	"tabSize",
	"widows",
	"zIndex",
	"zoom",
	"fillOpacity",
	"floodOpacity",
	"stopOpacity",
	"strokeDasharray",
	"strokeDashoffset",
	"strokeMiterlimit",
	"strokeOpacity",
	"strokeWidth",
];

pub(crate) const INNER_HTML: &str = "dangerouslySetInnerHTML";

/// Event name for an `on*` prop: `onClick` becomes `click`.
pub fn prop_event_name(prop: &str) -> Option<String> {
	let rest = prop.strip_prefix("on")?;
	if rest.len() < 2 {
		return None;
	}
	Some(rest.to_ascii_lowercase())
}

fn attribute_namespace(name: &str) -> Option<&'static str> {
	match name {
		"xlink:href" | "xlink:arcrole" | "xlink:actuate" | "xlink:role" | "xlink:title"
		| "xlink:type" => Some(XLINK_NAMESPACE),
		"xml:base" | "xml:lang" | "xml:space" => Some(XML_NAMESPACE),
		_ => None,
	}
}

/// CSS text for a style value.
pub fn style_value(name: &str, value: &StyleValue) -> String {
	match value {
		StyleValue::Str(text) => text.to_string(),
		StyleValue::Number(number) if UNITLESS_STYLES.contains(&name) => number.to_string(),
		StyleValue::Number(number) => format!("{number}px"),
	}
}

impl<S: Surface> Reconciler<S> {
	/// Applies every prop of a freshly created element.
	pub(crate) fn mount_props(&mut self, dom: NodeHandle, props: &Props, svg: bool) -> ReconcileResult<()> {
		for (name, value) in props.iter() {
			if !value.is_null() {
				self.apply_prop(dom, name, None, value, svg)?;
			}
		}
		Ok(())
	}

	/// Diffs two prop bags onto an element.
	pub(crate) fn patch_props(
		&mut self,
		last: &Props,
		next: &Props,
		dom: NodeHandle,
		svg: bool,
	) -> ReconcileResult<()> {
		for (name, value) in next.iter() {
			let previous = last.get(name).filter(|previous| !previous.is_null());
			if value.is_null() {
				if previous.is_some() {
					self.remove_prop(dom, name)?;
				}
			} else {
				self.apply_prop(dom, name, previous, value, svg)?;
			}
		}
		for (name, value) in last.iter() {
			if !value.is_null() && !next.contains(name) {
				self.remove_prop(dom, name)?;
			}
		}
		Ok(())
	}

	pub(crate) fn apply_prop(
		&mut self,
		dom: NodeHandle,
		name: &str,
		last: Option<&PropValue>,
		next: &PropValue,
		svg: bool,
	) -> ReconcileResult<()> {
		let bound = self.bindings.contains_key(&dom);

		if BOOLEAN_PROPS.contains(&name) {
			if bound && name == "checked" {
				return Ok(());
			}
			let value = next.is_truthy();
			if last.map(PropValue::is_truthy) != Some(value) {
				self.surface.set_bool_property(dom, name, value)?;
			}
			return Ok(());
		}
		if STRICT_PROPS.contains(&name) {
			if bound && name == "value" {
				return Ok(());
			}
			let value = next.to_attribute_string();
			if last.map(PropValue::to_attribute_string).as_ref() != Some(&value) {
				self.surface.set_value_property(dom, name, &value)?;
			}
			return Ok(());
		}
		if last == Some(next) {
			return Ok(());
		}

		match name {
			"className" | "class" => {
				let class = next.to_attribute_string();
				if svg {
					self.surface.set_attribute(dom, "class", &class)?;
				} else {
					self.surface.set_class_name(dom, &class)?;
				}
			}
			"style" => self.patch_style(dom, last, next)?,
			INNER_HTML => {
				let PropValue::Str(html) = next else {
					return self.report(ContractViolation::InnerHtmlWithoutContent);
				};
				if last.and_then(PropValue::as_str) != Some(html.as_ref()) {
					self.surface.set_inner_html(dom, html)?;
				}
			}
			_ => match (prop_event_name(name), next) {
				(Some(event), PropValue::Handler(handler)) => {
					if self.binding_owns(dom, &event) {
						return Ok(());
					}
					self.surface
						.set_event_listener(dom, &event, Some(handler.clone()))?;
				}
				_ => {
					let value = next.to_attribute_string();
					match attribute_namespace(name) {
						Some(namespace) => {
							self.surface.set_attribute_ns(dom, namespace, name, &value)?
						}
						None => self.surface.set_attribute(dom, name, &value)?,
					}
				}
			},
		}
		Ok(())
	}

	pub(crate) fn remove_prop(&mut self, dom: NodeHandle, name: &str) -> ReconcileResult<()> {
		if BOOLEAN_PROPS.contains(&name) {
			self.surface.set_bool_property(dom, name, false)?;
			return Ok(());
		}
		match name {
			"className" | "class" => self.surface.remove_attribute(dom, "class")?,
			"value" => {
				if !self.bindings.contains_key(&dom) {
					self.surface.set_value_property(dom, "value", "")?;
				}
			}
			INNER_HTML => self.surface.set_inner_html(dom, "")?,
			_ => match prop_event_name(name) {
				Some(event) => {
					if !self.binding_owns(dom, &event) {
						self.surface.set_event_listener(dom, &event, None)?;
					}
				}
				None => self.surface.remove_attribute(dom, name)?,
			},
		}
		Ok(())
	}

	fn binding_owns(&self, dom: NodeHandle, event: &str) -> bool {
		self.bindings
			.get(&dom)
			.is_some_and(|binding| binding.event() == event)
	}

	fn patch_style(
		&mut self,
		dom: NodeHandle,
		last: Option<&PropValue>,
		next: &PropValue,
	) -> ReconcileResult<()> {
		let PropValue::Style(next_style) = next else {
			self.surface
				.set_attribute(dom, "style", &next.to_attribute_string())?;
			return Ok(());
		};
		let previous = match last {
			Some(PropValue::Style(style)) => Some(style),
			Some(_) => {
				self.surface.remove_attribute(dom, "style")?;
				None
			}
			None => None,
		};
		self.apply_style(dom, previous, next_style)
	}

	fn apply_style(
		&mut self,
		dom: NodeHandle,
		previous: Option<&Style>,
		next: &Style,
	) -> ReconcileResult<()> {
		for (name, value) in next.iter() {
			if previous.and_then(|style| style.get(name)) != Some(value) {
				let css = style_value(name, value);
				self.surface.set_style_property(dom, name, Some(&css))?;
			}
		}
		if let Some(previous) = previous {
			for (name, _) in previous.iter() {
				if next.get(name).is_none() {
					self.surface.set_style_property(dom, name, None)?;
				}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("onClick", Some("click"))]
	#[case("oninput", Some("input"))]
	#[case("onDoubleClick", Some("doubleclick"))]
	#[case("on", None)]
	#[case("onx", None)]
	#[case("one", None)]
	#[case("title", None)]
	fn test_prop_event_name(#[case] prop: &str, #[case] expected: Option<&str>) {
		assert_eq!(prop_event_name(prop).as_deref(), expected);
	}

	#[rstest]
	#[case("width", StyleValue::Number(10.0), "10px")]
	#[case("opacity", StyleValue::Number(0.5), "0.5")]
	#[case("zIndex", StyleValue::Number(3.0), "3")]
	#[case("color", StyleValue::from("red"), "red")]
	fn test_style_value(#[case] name: &str, #[case] value: StyleValue, #[case] expected: &str) {
		assert_eq!(style_value(name, &value), expected);
	}

	#[rstest]
	#[case("xlink:href", Some(XLINK_NAMESPACE))]
	#[case("xml:lang", Some(XML_NAMESPACE))]
	#[case("href", None)]
	fn test_attribute_namespace(#[case] name: &str, #[case] expected: Option<&str>) {
		assert_eq!(attribute_namespace(name), expected);
	}
}
