//! In-memory surface.
//!
//! [`MemorySurface`] keeps nodes in an arena keyed by [`NodeHandle`] and records every
//! mutation the reconciler issues as a [`SurfaceOp`]. It serializes to HTML for server
//! side rendering and assertions, and can simulate user input for controlled inputs.

use super::{
	ControlledValue, Event, EventHandler, InputBinding, NodeDescriptor, NodeHandle, Surface,
	XLINK_NAMESPACE, XML_NAMESPACE,
};
use crate::error::{SurfaceError, SurfaceResult};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// A mutation recorded by [`MemorySurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
	/// `create_element`
	CreateElement { node: NodeHandle, tag: String },
	/// `create_text` / `create_placeholder`
	CreateText { node: NodeHandle, text: String },
	/// `create_fragment`
	CreateFragment { node: NodeHandle },
	/// `set_attribute` / `set_attribute_ns`
	SetAttribute { node: NodeHandle, name: String, value: String },
	/// `remove_attribute`
	RemoveAttribute { node: NodeHandle, name: String },
	/// `set_class_name`
	SetClassName { node: NodeHandle, class: String },
	/// `set_style_property`
	SetStyle { node: NodeHandle, name: String, value: Option<String> },
	/// `set_bool_property` / `set_value_property`
	SetProperty { node: NodeHandle, name: String, value: String },
	/// `set_inner_html`
	SetInnerHtml { node: NodeHandle, html: String },
	/// `set_text`
	SetText { node: NodeHandle, text: String },
	/// `set_text_content`
	SetTextContent { node: NodeHandle, text: String },
	/// `clear_children`
	ClearChildren { node: NodeHandle },
	/// `set_event_listener`
	SetListener { node: NodeHandle, event: String, installed: bool },
	/// `bind_controlled`
	Bind { node: NodeHandle, bound: bool },
	/// A detached node was placed under `parent`
	Insert { parent: NodeHandle, child: NodeHandle },
	/// An attached node was repositioned
	Move { parent: NodeHandle, child: NodeHandle },
	/// `remove_child`
	Remove { parent: NodeHandle, child: NodeHandle },
	/// `replace_child`
	Replace {
		parent: NodeHandle,
		new_child: NodeHandle,
		old_child: NodeHandle,
	},
}

impl SurfaceOp {
	/// Whether this op repositioned an already attached node.
	pub fn is_move(&self) -> bool {
		matches!(self, Self::Move { .. })
	}

	/// Whether this op created a node.
	pub fn is_create(&self) -> bool {
		matches!(
			self,
			Self::CreateElement { .. } | Self::CreateText { .. } | Self::CreateFragment { .. }
		)
	}

	/// Whether this op changed the tree structure.
	pub fn is_structural(&self) -> bool {
		matches!(
			self,
			Self::Insert { .. }
				| Self::Move { .. }
				| Self::Remove { .. }
				| Self::Replace { .. }
				| Self::ClearChildren { .. }
				| Self::SetTextContent { .. }
				| Self::SetInnerHtml { .. }
		)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MemoryKind {
	Element { tag: String, svg: bool },
	Text(String),
	Fragment,
}

struct MemoryNode {
	kind: MemoryKind,
	parent: Option<NodeHandle>,
	children: Vec<NodeHandle>,
	attributes: Vec<(String, String)>,
	style: Vec<(String, String)>,
	bool_props: BTreeMap<String, bool>,
	value_props: BTreeMap<String, String>,
	inner_html: Option<String>,
	listeners: HashMap<String, EventHandler>,
	binding: Option<Rc<InputBinding>>,
}

impl MemoryNode {
	fn new(kind: MemoryKind) -> Self {
		Self {
			kind,
			parent: None,
			children: Vec::new(),
			attributes: Vec::new(),
			style: Vec::new(),
			bool_props: BTreeMap::new(),
			value_props: BTreeMap::new(),
			inner_html: None,
			listeners: HashMap::new(),
			binding: None,
		}
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}
}

/// Arena backed [`Surface`] with a mutation log.
pub struct MemorySurface {
	nodes: HashMap<NodeHandle, MemoryNode>,
	next_id: u64,
	document_root: NodeHandle,
	ops: Vec<SurfaceOp>,
}

impl Default for MemorySurface {
	fn default() -> Self {
		Self::new()
	}
}

impl MemorySurface {
	/// Creates a surface containing only a `body` document root.
	pub fn new() -> Self {
		let mut surface = Self {
			nodes: HashMap::new(),
			next_id: 1,
			document_root: NodeHandle::from_raw(0),
			ops: Vec::new(),
		};
		surface.document_root = surface.alloc(MemoryKind::Element {
			tag: "body".to_string(),
			svg: false,
		});
		surface
	}

	/// The document root. Rendering into it is a contract violation.
	pub fn document_root(&self) -> NodeHandle {
		self.document_root
	}

	/// Creates a `div` attached to the document root, ready to be used as a container.
	pub fn create_container(&mut self) -> SurfaceResult<NodeHandle> {
		let container = self.alloc(MemoryKind::Element {
			tag: "div".to_string(),
			svg: false,
		});
		self.attach(self.document_root, container, None)?;
		Ok(container)
	}

	/// Recorded mutations, oldest first.
	pub fn ops(&self) -> &[SurfaceOp] {
		&self.ops
	}

	/// Drains the mutation log.
	pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
		std::mem::take(&mut self.ops)
	}

	/// Clears the mutation log.
	pub fn clear_ops(&mut self) {
		self.ops.clear();
	}

	/// Number of nodes ever allocated and still held by the arena.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Tag name of an element.
	pub fn tag_name(&self, node: NodeHandle) -> Option<&str> {
		match &self.nodes.get(&node)?.kind {
			MemoryKind::Element { tag, .. } => Some(tag),
			_ => None,
		}
	}

	/// Whether the element was created in the SVG namespace.
	pub fn is_svg(&self, node: NodeHandle) -> bool {
		matches!(
			self.nodes.get(&node).map(|n| &n.kind),
			Some(MemoryKind::Element { svg: true, .. })
		)
	}

	/// Content of a text node.
	pub fn text(&self, node: NodeHandle) -> Option<&str> {
		match &self.nodes.get(&node)?.kind {
			MemoryKind::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Concatenated text of a subtree.
	pub fn text_content(&self, node: NodeHandle) -> String {
		let mut out = String::new();
		self.collect_text(node, &mut out);
		out
	}

	/// All attributes in insertion order.
	pub fn attributes(&self, node: NodeHandle) -> Vec<(String, String)> {
		self.nodes
			.get(&node)
			.map(|n| n.attributes.clone())
			.unwrap_or_default()
	}

	/// A single inline style property.
	pub fn style(&self, node: NodeHandle, name: &str) -> Option<String> {
		self.nodes
			.get(&node)?
			.style
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	/// A boolean property, `false` when never set.
	pub fn bool_property(&self, node: NodeHandle, name: &str) -> bool {
		self.nodes
			.get(&node)
			.and_then(|n| n.bool_props.get(name).copied())
			.unwrap_or(false)
	}

	/// A string property.
	pub fn value_property(&self, node: NodeHandle, name: &str) -> Option<String> {
		self.nodes.get(&node)?.value_props.get(name).cloned()
	}

	/// Raw markup set through `set_inner_html`.
	pub fn inner_html(&self, node: NodeHandle) -> Option<String> {
		self.nodes.get(&node)?.inner_html.clone()
	}

	/// Whether a listener is installed for the event.
	pub fn has_listener(&self, node: NodeHandle, event: &str) -> bool {
		self.nodes
			.get(&node)
			.is_some_and(|n| n.listeners.contains_key(event))
	}

	/// The controlled input binding attached to a node.
	pub fn binding(&self, node: NodeHandle) -> Option<Rc<InputBinding>> {
		self.nodes.get(&node)?.binding.clone()
	}

	/// Dispatches an event to a node.
	///
	/// A binding listening to the event re-applies its controlled value (and that of
	/// its radio group) before forwarding. A plain listener is called afterwards.
	pub fn dispatch(&mut self, event: Event) -> SurfaceResult<()> {
		let target = event.target();
		let node = self.node(target)?;
		let binding = node
			.binding
			.clone()
			.filter(|binding| binding.event() == event.name());
		let listener = node.listeners.get(event.name()).cloned();

		if let Some(binding) = binding {
			self.reassert(target, &binding)?;
			if let Some(group) = binding.group() {
				self.reassert_group(&group, target)?;
			}
			binding.forward(&event);
		}
		if let Some(listener) = listener {
			listener(&event);
		}
		Ok(())
	}

	/// Simulates the user typing `value` into an input.
	pub fn type_text(&mut self, node: NodeHandle, value: &str) -> SurfaceResult<()> {
		self.node_mut(node)?
			.value_props
			.insert("value".to_string(), value.to_string());
		self.dispatch(Event::new("input", node).with_value(value))
	}

	/// Simulates a click, toggling checkboxes and selecting radios.
	pub fn click(&mut self, node: NodeHandle) -> SurfaceResult<()> {
		let current = self.node(node)?;
		let input_type = current.attribute("type").map(str::to_ascii_lowercase);
		let group = current.attribute("name").map(str::to_string);
		let checked = match input_type.as_deref() {
			Some("checkbox") => Some(!self.bool_property(node, "checked")),
			Some("radio") => Some(true),
			_ => None,
		};

		let mut event = Event::new("click", node);
		if let Some(checked) = checked {
			if input_type.as_deref() == Some("radio")
				&& let Some(group) = &group
			{
				let peers: Vec<NodeHandle> = self
					.nodes
					.iter()
					.filter(|(handle, n)| {
						**handle != node
							&& n.attribute("type") == Some("radio")
							&& n.attribute("name") == Some(group.as_str())
					})
					.map(|(handle, _)| *handle)
					.collect();
				for peer in peers {
					self.node_mut(peer)?
						.bool_props
						.insert("checked".to_string(), false);
				}
			}
			self.node_mut(node)?
				.bool_props
				.insert("checked".to_string(), checked);
			event = event.with_checked(checked);
		}
		self.dispatch(event)
	}

	/// Serializes a subtree to HTML.
	pub fn to_html(&self, node: NodeHandle) -> String {
		let mut out = String::new();
		self.write_html(node, &mut out);
		out
	}

	/// Serializes the children of a node to HTML.
	pub fn inner_to_html(&self, node: NodeHandle) -> String {
		let mut out = String::new();
		if let Some(n) = self.nodes.get(&node) {
			if let Some(html) = &n.inner_html {
				out.push_str(html);
			}
			for child in &n.children {
				self.write_html(*child, &mut out);
			}
		}
		out
	}

	fn alloc(&mut self, kind: MemoryKind) -> NodeHandle {
		let handle = NodeHandle::from_raw(self.next_id);
		self.next_id += 1;
		self.nodes.insert(handle, MemoryNode::new(kind));
		handle
	}

	fn node(&self, handle: NodeHandle) -> SurfaceResult<&MemoryNode> {
		self.nodes
			.get(&handle)
			.ok_or(SurfaceError::UnknownHandle(handle))
	}

	fn node_mut(&mut self, handle: NodeHandle) -> SurfaceResult<&mut MemoryNode> {
		self.nodes
			.get_mut(&handle)
			.ok_or(SurfaceError::UnknownHandle(handle))
	}

	fn element_mut(&mut self, handle: NodeHandle, op: &'static str) -> SurfaceResult<&mut MemoryNode> {
		let node = self.node_mut(handle)?;
		match node.kind {
			MemoryKind::Element { .. } => Ok(node),
			_ => Err(SurfaceError::rejected(op, format!("{handle} is not an element"))),
		}
	}

	fn detach(&mut self, child: NodeHandle) -> SurfaceResult<()> {
		let parent = self.node_mut(child)?.parent.take();
		if let Some(parent) = parent {
			self.node_mut(parent)?.children.retain(|c| *c != child);
		}
		Ok(())
	}

	/// Places `child` under `parent` before `anchor`, expanding fragments.
	/// Returns whether `child` was attached somewhere before.
	fn attach(
		&mut self,
		parent: NodeHandle,
		child: NodeHandle,
		anchor: Option<NodeHandle>,
	) -> SurfaceResult<bool> {
		if parent == child {
			return Err(SurfaceError::rejected("insert", "cannot insert a node into itself"));
		}
		self.node(parent)?;
		let moving = if self.node(child)?.kind == MemoryKind::Fragment {
			std::mem::take(&mut self.node_mut(child)?.children)
		} else {
			vec![child]
		};
		let was_attached = self.node(child)?.parent.is_some();

		for node in &moving {
			self.detach(*node)?;
		}
		let mut index = match anchor {
			Some(anchor) => self
				.node(parent)?
				.children
				.iter()
				.position(|c| *c == anchor)
				.ok_or_else(|| {
					SurfaceError::rejected("insert", format!("{anchor} is not a child of {parent}"))
				})?,
			None => self.node(parent)?.children.len(),
		};
		for node in moving {
			self.node_mut(node)?.parent = Some(parent);
			self.node_mut(parent)?.children.insert(index, node);
			index += 1;
		}
		Ok(was_attached)
	}

	fn record_placement(&mut self, parent: NodeHandle, child: NodeHandle, was_attached: bool) {
		if was_attached {
			self.ops.push(SurfaceOp::Move { parent, child });
		} else {
			self.ops.push(SurfaceOp::Insert { parent, child });
		}
	}

	fn reassert(&mut self, node: NodeHandle, binding: &InputBinding) -> SurfaceResult<()> {
		let target = self.node_mut(node)?;
		match binding.controlled_value() {
			ControlledValue::Checked(checked) => {
				target.bool_props.insert("checked".to_string(), checked);
			}
			ControlledValue::Value(value) => {
				target.value_props.insert("value".to_string(), value);
			}
		}
		Ok(())
	}

	fn reassert_group(&mut self, group: &str, except: NodeHandle) -> SurfaceResult<()> {
		let peers: Vec<(NodeHandle, Rc<InputBinding>)> = self
			.nodes
			.iter()
			.filter(|(handle, _)| **handle != except)
			.filter_map(|(handle, n)| n.binding.clone().map(|b| (*handle, b)))
			.filter(|(_, binding)| binding.group().as_deref() == Some(group))
			.collect();
		for (peer, binding) in peers {
			self.reassert(peer, &binding)?;
		}
		Ok(())
	}

	fn collect_text(&self, node: NodeHandle, out: &mut String) {
		let Some(n) = self.nodes.get(&node) else {
			return;
		};
		if let MemoryKind::Text(text) = &n.kind {
			out.push_str(text);
		}
		for child in &n.children {
			self.collect_text(*child, out);
		}
	}

	fn write_html(&self, node: NodeHandle, out: &mut String) {
		let Some(n) = self.nodes.get(&node) else {
			return;
		};
		match &n.kind {
			MemoryKind::Text(text) => out.push_str(&escape(text, false)),
			MemoryKind::Fragment => {
				for child in &n.children {
					self.write_html(*child, out);
				}
			}
			MemoryKind::Element { tag, .. } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in &n.attributes {
					if name == "style" && !n.style.is_empty() {
						continue;
					}
					out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
				}
				if !n.style.is_empty() {
					let css: Vec<String> = n.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
					out.push_str(&format!(" style=\"{}\"", escape(&css.join("; "), true)));
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return;
				}
				if let Some(html) = &n.inner_html {
					out.push_str(html);
				}
				for child in &n.children {
					self.write_html(*child, out);
				}
				out.push_str(&format!("</{tag}>"));
			}
		}
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' if attribute => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
	out
}

fn qualified_name(namespace: &str, name: &str) -> String {
	let prefix = match namespace {
		XLINK_NAMESPACE => "xlink",
		XML_NAMESPACE => "xml",
		_ => return name.to_string(),
	};
	if name.contains(':') {
		name.to_string()
	} else {
		format!("{prefix}:{name}")
	}
}

impl Surface for MemorySurface {
	fn create_element(&mut self, tag: &str, svg: bool) -> SurfaceResult<NodeHandle> {
		let node = self.alloc(MemoryKind::Element {
			tag: tag.to_string(),
			svg,
		});
		self.ops.push(SurfaceOp::CreateElement {
			node,
			tag: tag.to_string(),
		});
		Ok(node)
	}

	fn create_text(&mut self, text: &str) -> SurfaceResult<NodeHandle> {
		let node = self.alloc(MemoryKind::Text(text.to_string()));
		self.ops.push(SurfaceOp::CreateText {
			node,
			text: text.to_string(),
		});
		Ok(node)
	}

	fn create_fragment(&mut self) -> SurfaceResult<NodeHandle> {
		let node = self.alloc(MemoryKind::Fragment);
		self.ops.push(SurfaceOp::CreateFragment { node });
		Ok(node)
	}

	fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> SurfaceResult<()> {
		let element = self.element_mut(node, "set_attribute")?;
		match element.attributes.iter_mut().find(|(key, _)| key == name) {
			Some((_, current)) => *current = value.to_string(),
			None => element
				.attributes
				.push((name.to_string(), value.to_string())),
		}
		if name == "style" {
			element.style.clear();
		}
		self.ops.push(SurfaceOp::SetAttribute {
			node,
			name: name.to_string(),
			value: value.to_string(),
		});
		Ok(())
	}

	fn set_attribute_ns(
		&mut self,
		node: NodeHandle,
		namespace: &str,
		name: &str,
		value: &str,
	) -> SurfaceResult<()> {
		self.set_attribute(node, &qualified_name(namespace, name), value)
	}

	fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> SurfaceResult<()> {
		let element = self.element_mut(node, "remove_attribute")?;
		element.attributes.retain(|(key, _)| key != name);
		if name == "style" {
			element.style.clear();
		}
		self.ops.push(SurfaceOp::RemoveAttribute {
			node,
			name: name.to_string(),
		});
		Ok(())
	}

	fn get_attribute(&self, node: NodeHandle, name: &str) -> SurfaceResult<Option<String>> {
		Ok(self.node(node)?.attribute(name).map(str::to_string))
	}

	fn set_class_name(&mut self, node: NodeHandle, class: &str) -> SurfaceResult<()> {
		let element = self.element_mut(node, "set_class_name")?;
		match element.attributes.iter_mut().find(|(key, _)| key == "class") {
			Some((_, current)) => *current = class.to_string(),
			None => element
				.attributes
				.push(("class".to_string(), class.to_string())),
		}
		self.ops.push(SurfaceOp::SetClassName {
			node,
			class: class.to_string(),
		});
		Ok(())
	}

	fn set_style_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: Option<&str>,
	) -> SurfaceResult<()> {
		let element = self.element_mut(node, "set_style_property")?;
		match value {
			Some(value) => match element.style.iter_mut().find(|(key, _)| key == name) {
				Some((_, current)) => *current = value.to_string(),
				None => element.style.push((name.to_string(), value.to_string())),
			},
			None => element.style.retain(|(key, _)| key != name),
		}
		self.ops.push(SurfaceOp::SetStyle {
			node,
			name: name.to_string(),
			value: value.map(str::to_string),
		});
		Ok(())
	}

	fn set_bool_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: bool,
	) -> SurfaceResult<()> {
		self.element_mut(node, "set_bool_property")?
			.bool_props
			.insert(name.to_string(), value);
		self.ops.push(SurfaceOp::SetProperty {
			node,
			name: name.to_string(),
			value: value.to_string(),
		});
		Ok(())
	}

	fn set_value_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: &str,
	) -> SurfaceResult<()> {
		self.element_mut(node, "set_value_property")?
			.value_props
			.insert(name.to_string(), value.to_string());
		self.ops.push(SurfaceOp::SetProperty {
			node,
			name: name.to_string(),
			value: value.to_string(),
		});
		Ok(())
	}

	fn set_inner_html(&mut self, node: NodeHandle, html: &str) -> SurfaceResult<()> {
		self.element_mut(node, "set_inner_html")?;
		let children = std::mem::take(&mut self.node_mut(node)?.children);
		for child in children {
			self.node_mut(child)?.parent = None;
		}
		self.node_mut(node)?.inner_html = Some(html.to_string());
		self.ops.push(SurfaceOp::SetInnerHtml {
			node,
			html: html.to_string(),
		});
		Ok(())
	}

	fn set_text(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()> {
		let target = self.node_mut(node)?;
		match &mut target.kind {
			MemoryKind::Text(current) => *current = text.to_string(),
			_ => {
				return Err(SurfaceError::rejected(
					"set_text",
					format!("{node} is not a text node"),
				));
			}
		}
		self.ops.push(SurfaceOp::SetText {
			node,
			text: text.to_string(),
		});
		Ok(())
	}

	fn set_text_content(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()> {
		self.element_mut(node, "set_text_content")?;
		let children = std::mem::take(&mut self.node_mut(node)?.children);
		for child in children {
			self.node_mut(child)?.parent = None;
		}
		let text_node = self.alloc(MemoryKind::Text(text.to_string()));
		let element = self.node_mut(node)?;
		element.inner_html = None;
		element.children.push(text_node);
		self.node_mut(text_node)?.parent = Some(node);
		self.ops.push(SurfaceOp::SetTextContent {
			node,
			text: text.to_string(),
		});
		Ok(())
	}

	fn clear_children(&mut self, node: NodeHandle) -> SurfaceResult<()> {
		let children = std::mem::take(&mut self.node_mut(node)?.children);
		for child in children {
			self.node_mut(child)?.parent = None;
		}
		self.node_mut(node)?.inner_html = None;
		self.ops.push(SurfaceOp::ClearChildren { node });
		Ok(())
	}

	fn set_event_listener(
		&mut self,
		node: NodeHandle,
		event: &str,
		handler: Option<EventHandler>,
	) -> SurfaceResult<()> {
		let element = self.element_mut(node, "set_event_listener")?;
		let installed = handler.is_some();
		match handler {
			Some(handler) => {
				element.listeners.insert(event.to_string(), handler);
			}
			None => {
				element.listeners.remove(event);
			}
		}
		self.ops.push(SurfaceOp::SetListener {
			node,
			event: event.to_string(),
			installed,
		});
		Ok(())
	}

	fn bind_controlled(
		&mut self,
		node: NodeHandle,
		binding: Option<Rc<InputBinding>>,
	) -> SurfaceResult<()> {
		let element = self.element_mut(node, "bind_controlled")?;
		let bound = binding.is_some();
		element.binding = binding;
		self.ops.push(SurfaceOp::Bind { node, bound });
		Ok(())
	}

	fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()> {
		let was_attached = self.attach(parent, child, None)?;
		self.record_placement(parent, child, was_attached);
		Ok(())
	}

	fn insert_before(
		&mut self,
		parent: NodeHandle,
		child: NodeHandle,
		anchor: NodeHandle,
	) -> SurfaceResult<()> {
		if child == anchor {
			return Ok(());
		}
		let was_attached = self.attach(parent, child, Some(anchor))?;
		self.record_placement(parent, child, was_attached);
		Ok(())
	}

	fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()> {
		if self.node(child)?.parent != Some(parent) {
			return Err(SurfaceError::rejected(
				"remove_child",
				format!("{child} is not a child of {parent}"),
			));
		}
		self.detach(child)?;
		self.ops.push(SurfaceOp::Remove { parent, child });
		Ok(())
	}

	fn replace_child(
		&mut self,
		parent: NodeHandle,
		new_child: NodeHandle,
		old_child: NodeHandle,
	) -> SurfaceResult<()> {
		if self.node(old_child)?.parent != Some(parent) {
			return Err(SurfaceError::rejected(
				"replace_child",
				format!("{old_child} is not a child of {parent}"),
			));
		}
		if new_child != old_child {
			self.attach(parent, new_child, Some(old_child))?;
			self.detach(old_child)?;
		}
		self.ops.push(SurfaceOp::Replace {
			parent,
			new_child,
			old_child,
		});
		Ok(())
	}

	fn child_nodes(&self, node: NodeHandle) -> SurfaceResult<Vec<NodeHandle>> {
		Ok(self.node(node)?.children.clone())
	}

	fn parent_node(&self, node: NodeHandle) -> SurfaceResult<Option<NodeHandle>> {
		Ok(self.node(node)?.parent)
	}

	fn describe(&self, node: NodeHandle) -> SurfaceResult<NodeDescriptor> {
		Ok(match &self.node(node)?.kind {
			MemoryKind::Element { tag, .. } => NodeDescriptor::Element { tag: tag.clone() },
			MemoryKind::Text(text) => NodeDescriptor::Text(text.clone()),
			MemoryKind::Fragment => NodeDescriptor::Fragment,
		})
	}

	fn is_document_root(&self, node: NodeHandle) -> bool {
		node == self.document_root
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;

	#[fixture]
	fn surface() -> MemorySurface {
		MemorySurface::new()
	}

	#[rstest]
	fn test_append_and_serialize(mut surface: MemorySurface) {
		// Arrange
		let ul = surface.create_element("ul", false).unwrap();
		let li = surface.create_element("li", false).unwrap();
		let text = surface.create_text("a < b").unwrap();
		surface.set_attribute(ul, "id", "list").unwrap();

		// Act
		surface.append_child(li, text).unwrap();
		surface.append_child(ul, li).unwrap();

		// Assert
		assert_eq!(surface.to_html(ul), r#"<ul id="list"><li>a &lt; b</li></ul>"#);
	}

	#[rstest]
	fn test_fragment_children_move_into_parent(mut surface: MemorySurface) {
		// Arrange
		let parent = surface.create_element("div", false).unwrap();
		let tail = surface.create_element("p", false).unwrap();
		surface.append_child(parent, tail).unwrap();
		let fragment = surface.create_fragment().unwrap();
		let a = surface.create_text("a").unwrap();
		let b = surface.create_text("b").unwrap();
		surface.append_child(fragment, a).unwrap();
		surface.append_child(fragment, b).unwrap();

		// Act
		surface.insert_before(parent, fragment, tail).unwrap();

		// Assert
		assert_eq!(surface.child_nodes(parent).unwrap(), vec![a, b, tail]);
		assert!(surface.child_nodes(fragment).unwrap().is_empty());
		assert_eq!(surface.parent_node(a).unwrap(), Some(parent));
	}

	#[rstest]
	fn test_move_is_recorded_for_attached_nodes(mut surface: MemorySurface) {
		// Arrange
		let parent = surface.create_element("div", false).unwrap();
		let a = surface.create_element("i", false).unwrap();
		let b = surface.create_element("b", false).unwrap();
		surface.append_child(parent, a).unwrap();
		surface.append_child(parent, b).unwrap();
		surface.clear_ops();

		// Act
		surface.insert_before(parent, b, a).unwrap();

		// Assert
		assert_eq!(surface.ops(), &[SurfaceOp::Move { parent, child: b }]);
		assert_eq!(surface.child_nodes(parent).unwrap(), vec![b, a]);
	}

	#[rstest]
	fn test_replace_child_swaps_position(mut surface: MemorySurface) {
		let parent = surface.create_element("div", false).unwrap();
		let old = surface.create_element("span", false).unwrap();
		let new = surface.create_element("em", false).unwrap();
		surface.append_child(parent, old).unwrap();

		surface.replace_child(parent, new, old).unwrap();

		assert_eq!(surface.child_nodes(parent).unwrap(), vec![new]);
		assert_eq!(surface.parent_node(old).unwrap(), None);
	}

	#[rstest]
	fn test_unknown_handle(surface: MemorySurface) {
		let missing = NodeHandle::from_raw(999);

		let result = surface.child_nodes(missing);

		assert_eq!(result, Err(SurfaceError::UnknownHandle(missing)));
	}

	#[rstest]
	fn test_set_text_content_empty_leaves_placeholder(mut surface: MemorySurface) {
		let div = surface.create_element("div", false).unwrap();

		surface.set_text_content(div, "").unwrap();

		let children = surface.child_nodes(div).unwrap();
		assert_eq!(children.len(), 1);
		assert_eq!(surface.text(children[0]), Some(""));
	}

	#[rstest]
	fn test_style_and_namespaced_attributes(mut surface: MemorySurface) {
		let node = surface.create_element("use", true).unwrap();

		surface
			.set_attribute_ns(node, XLINK_NAMESPACE, "xlink:href", "#icon")
			.unwrap();
		surface.set_style_property(node, "width", Some("10px")).unwrap();

		assert!(surface.is_svg(node));
		assert_eq!(
			surface.get_attribute(node, "xlink:href").unwrap().as_deref(),
			Some("#icon")
		);
		assert_eq!(
			surface.to_html(node),
			r##"<use xlink:href="#icon" style="width: 10px"></use>"##
		);
	}

	#[rstest]
	fn test_dispatch_calls_listener(mut surface: MemorySurface) {
		// Arrange
		let button = surface.create_element("button", false).unwrap();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = seen.clone();
		surface
			.set_event_listener(
				button,
				"click",
				Some(Rc::new(move |event: &Event| {
					sink.borrow_mut().push(event.name().to_string())
				})),
			)
			.unwrap();

		// Act
		surface.click(button).unwrap();

		// Assert
		assert_eq!(*seen.borrow(), vec!["click".to_string()]);
	}

	#[rstest]
	fn test_bound_input_reasserts_value(mut surface: MemorySurface) {
		// Arrange
		let input = surface.create_element("input", false).unwrap();
		let typed = Rc::new(RefCell::new(None));
		let sink = typed.clone();
		let binding = Rc::new(InputBinding::new(
			ControlledValue::Value("fixed".into()),
			Some(Rc::new(move |event: &Event| {
				*sink.borrow_mut() = event.value().map(str::to_string)
			})),
			None,
		));
		surface.bind_controlled(input, Some(binding)).unwrap();

		// Act
		surface.type_text(input, "fixedX").unwrap();

		// Assert
		assert_eq!(surface.value_property(input, "value").as_deref(), Some("fixed"));
		assert_eq!(typed.borrow().as_deref(), Some("fixedX"));
	}

	#[rstest]
	fn test_document_root(mut surface: MemorySurface) {
		let container = surface.create_container().unwrap();

		assert!(surface.is_document_root(surface.document_root()));
		assert!(!surface.is_document_root(container));
		assert_eq!(
			surface.parent_node(container).unwrap(),
			Some(surface.document_root())
		);
	}
}
