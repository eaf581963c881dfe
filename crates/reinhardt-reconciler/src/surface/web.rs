//! Browser DOM surface built on `web-sys`.
//!
//! DOM nodes are tracked in a registry and tagged with their handle through a
//! private JS property, so nodes produced by the server (found while hydrating)
//! get a stable handle the first time they are seen.

use super::{
	ControlledValue, Event, EventHandler, InputBinding, NodeDescriptor, NodeHandle, SVG_NAMESPACE,
	Surface,
};
use crate::error::{SurfaceError, SurfaceResult};
use js_sys::Reflect;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, Node};

const HANDLE_PROPERTY: &str = "__rhHandle";

type Listener = Closure<dyn FnMut(web_sys::Event)>;
type BoundNodes = Rc<RefCell<HashMap<NodeHandle, (Node, Rc<InputBinding>)>>>;

#[derive(Default)]
struct Registry {
	nodes: HashMap<NodeHandle, Node>,
	next_id: u64,
}

/// [`Surface`] backed by the browser DOM.
pub struct WebSurface {
	document: Document,
	registry: RefCell<Registry>,
	listeners: HashMap<(NodeHandle, String), Listener>,
	binding_listeners: HashMap<NodeHandle, (String, Listener)>,
	bound: BoundNodes,
}

fn js_error(op: &'static str) -> impl Fn(JsValue) -> SurfaceError {
	move |value| SurfaceError::rejected(op, format!("{value:?}"))
}

/// Converts `fontWeight` style keys to `font-weight`.
fn css_property_name(name: &str) -> String {
	if name.starts_with("--") {
		return name.to_string();
	}
	let mut out = String::with_capacity(name.len() + 4);
	for c in name.chars() {
		if c.is_ascii_uppercase() {
			out.push('-');
			out.push(c.to_ascii_lowercase());
		} else {
			out.push(c);
		}
	}
	out
}

fn read_value(node: &Node) -> Option<String> {
	Reflect::get(node, &JsValue::from_str("value"))
		.ok()
		.and_then(|value| value.as_string())
}

fn read_checked(node: &Node) -> Option<bool> {
	Reflect::get(node, &JsValue::from_str("checked"))
		.ok()
		.and_then(|value| value.as_bool())
}

fn apply_controlled(node: &Node, binding: &InputBinding) {
	let (name, value) = match binding.controlled_value() {
		ControlledValue::Checked(checked) => ("checked", JsValue::from_bool(checked)),
		ControlledValue::Value(value) => ("value", JsValue::from_str(&value)),
	};
	if let Err(err) = Reflect::set(node, &JsValue::from_str(name), &value) {
		tracing::warn!(?err, "failed to re-apply controlled {name}");
	}
}

impl WebSurface {
	/// Creates a surface for the current window's document.
	pub fn new() -> SurfaceResult<Self> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| SurfaceError::rejected("new", "no document available"))?;
		Ok(Self::with_document(document))
	}

	/// Creates a surface for a specific document.
	pub fn with_document(document: Document) -> Self {
		Self {
			document,
			registry: RefCell::new(Registry::default()),
			listeners: HashMap::new(),
			binding_listeners: HashMap::new(),
			bound: Rc::new(RefCell::new(HashMap::new())),
		}
	}

	/// Returns the handle of an existing DOM node, registering it on first sight.
	pub fn handle_for(&self, node: &Node) -> NodeHandle {
		if let Some(raw) = Reflect::get(node, &JsValue::from_str(HANDLE_PROPERTY))
			.ok()
			.and_then(|value| value.as_f64())
		{
			let handle = NodeHandle::from_raw(raw as u64);
			if self.registry.borrow().nodes.contains_key(&handle) {
				return handle;
			}
		}
		let mut registry = self.registry.borrow_mut();
		registry.next_id += 1;
		let handle = NodeHandle::from_raw(registry.next_id);
		// Handles stay well below 2^53 so the f64 round trip is exact
		let _ = Reflect::set(
			node,
			&JsValue::from_str(HANDLE_PROPERTY),
			&JsValue::from_f64(handle.raw() as f64),
		);
		registry.nodes.insert(handle, node.clone());
		handle
	}

	/// Returns the handle of an element looked up by id.
	pub fn element_by_id(&self, id: &str) -> Option<NodeHandle> {
		self.document
			.get_element_by_id(id)
			.map(|element| self.handle_for(&element))
	}

	/// The DOM node behind a handle.
	pub fn node(&self, handle: NodeHandle) -> SurfaceResult<Node> {
		self.registry
			.borrow()
			.nodes
			.get(&handle)
			.cloned()
			.ok_or(SurfaceError::UnknownHandle(handle))
	}

	fn element(&self, handle: NodeHandle, op: &'static str) -> SurfaceResult<Element> {
		self.node(handle)?
			.dyn_into::<Element>()
			.map_err(|_| SurfaceError::rejected(op, format!("{handle} is not an element")))
	}

	fn style(&self, handle: NodeHandle) -> SurfaceResult<CssStyleDeclaration> {
		let node = self.node(handle)?;
		Reflect::get(&node, &JsValue::from_str("style"))
			.map_err(js_error("set_style_property"))?
			.dyn_into::<CssStyleDeclaration>()
			.map_err(|_| SurfaceError::rejected("set_style_property", "node has no style"))
	}

	fn unbind(&mut self, handle: NodeHandle) -> SurfaceResult<()> {
		if let Some((event, listener)) = self.binding_listeners.remove(&handle) {
			self.node(handle)?
				.remove_event_listener_with_callback(&event, listener.as_ref().unchecked_ref())
				.map_err(js_error("bind_controlled"))?;
		}
		self.bound.borrow_mut().remove(&handle);
		Ok(())
	}
}

impl Surface for WebSurface {
	fn create_element(&mut self, tag: &str, svg: bool) -> SurfaceResult<NodeHandle> {
		let element = if svg {
			self.document.create_element_ns(Some(SVG_NAMESPACE), tag)
		} else {
			self.document.create_element(tag)
		}
		.map_err(js_error("create_element"))?;
		Ok(self.handle_for(&element))
	}

	fn create_text(&mut self, text: &str) -> SurfaceResult<NodeHandle> {
		let node = self.document.create_text_node(text);
		Ok(self.handle_for(&node))
	}

	fn create_fragment(&mut self) -> SurfaceResult<NodeHandle> {
		let node = self.document.create_document_fragment();
		Ok(self.handle_for(&node))
	}

	fn set_attribute(&mut self, node: NodeHandle, name: &str, value: &str) -> SurfaceResult<()> {
		self.element(node, "set_attribute")?
			.set_attribute(name, value)
			.map_err(js_error("set_attribute"))
	}

	fn set_attribute_ns(
		&mut self,
		node: NodeHandle,
		namespace: &str,
		name: &str,
		value: &str,
	) -> SurfaceResult<()> {
		self.element(node, "set_attribute_ns")?
			.set_attribute_ns(Some(namespace), name, value)
			.map_err(js_error("set_attribute_ns"))
	}

	fn remove_attribute(&mut self, node: NodeHandle, name: &str) -> SurfaceResult<()> {
		self.element(node, "remove_attribute")?
			.remove_attribute(name)
			.map_err(js_error("remove_attribute"))
	}

	fn get_attribute(&self, node: NodeHandle, name: &str) -> SurfaceResult<Option<String>> {
		Ok(self.node(node)?
			.dyn_ref::<Element>()
			.and_then(|element| element.get_attribute(name)))
	}

	fn set_class_name(&mut self, node: NodeHandle, class: &str) -> SurfaceResult<()> {
		self.element(node, "set_class_name")?.set_class_name(class);
		Ok(())
	}

	fn set_style_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: Option<&str>,
	) -> SurfaceResult<()> {
		let style = self.style(node)?;
		let property = css_property_name(name);
		match value {
			Some(value) => style
				.set_property(&property, value)
				.map_err(js_error("set_style_property")),
			None => style
				.remove_property(&property)
				.map(|_| ())
				.map_err(js_error("set_style_property")),
		}
	}

	fn set_bool_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: bool,
	) -> SurfaceResult<()> {
		Reflect::set(
			&self.node(node)?,
			&JsValue::from_str(name),
			&JsValue::from_bool(value),
		)
		.map(|_| ())
		.map_err(js_error("set_bool_property"))
	}

	fn set_value_property(
		&mut self,
		node: NodeHandle,
		name: &str,
		value: &str,
	) -> SurfaceResult<()> {
		Reflect::set(
			&self.node(node)?,
			&JsValue::from_str(name),
			&JsValue::from_str(value),
		)
		.map(|_| ())
		.map_err(js_error("set_value_property"))
	}

	fn set_inner_html(&mut self, node: NodeHandle, html: &str) -> SurfaceResult<()> {
		self.element(node, "set_inner_html")?.set_inner_html(html);
		Ok(())
	}

	fn set_text(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()> {
		self.node(node)?.set_node_value(Some(text));
		Ok(())
	}

	fn set_text_content(&mut self, node: NodeHandle, text: &str) -> SurfaceResult<()> {
		let target = self.node(node)?;
		target.set_text_content(Some(text));
		if text.is_empty() {
			let placeholder = self.document.create_text_node("");
			target
				.append_child(&placeholder)
				.map_err(js_error("set_text_content"))?;
		}
		Ok(())
	}

	fn clear_children(&mut self, node: NodeHandle) -> SurfaceResult<()> {
		self.node(node)?.set_text_content(None);
		Ok(())
	}

	fn set_event_listener(
		&mut self,
		node: NodeHandle,
		event: &str,
		handler: Option<EventHandler>,
	) -> SurfaceResult<()> {
		let target = self.node(node)?;
		let key = (node, event.to_string());
		if let Some(previous) = self.listeners.remove(&key) {
			target
				.remove_event_listener_with_callback(event, previous.as_ref().unchecked_ref())
				.map_err(js_error("set_event_listener"))?;
		}
		let Some(handler) = handler else {
			return Ok(());
		};
		let name = event.to_string();
		let listener = Closure::wrap(Box::new(move |_: web_sys::Event| {
			handler(&Event::new(name.clone(), node));
		}) as Box<dyn FnMut(web_sys::Event)>);
		target
			.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
			.map_err(js_error("set_event_listener"))?;
		self.listeners.insert(key, listener);
		Ok(())
	}

	fn bind_controlled(
		&mut self,
		node: NodeHandle,
		binding: Option<Rc<InputBinding>>,
	) -> SurfaceResult<()> {
		self.unbind(node)?;
		let Some(binding) = binding else {
			return Ok(());
		};
		let target = self.node(node)?;
		let event = binding.event();
		let bound = self.bound.clone();
		let own_node = target.clone();
		let own_binding = binding.clone();
		let listener = Closure::wrap(Box::new(move |_: web_sys::Event| {
			let mut dispatched = Event::new(event, node);
			if let Some(value) = read_value(&own_node) {
				dispatched = dispatched.with_value(value);
			}
			if let Some(checked) = read_checked(&own_node) {
				dispatched = dispatched.with_checked(checked);
			}
			apply_controlled(&own_node, &own_binding);
			if let Some(group) = own_binding.group() {
				let peers: Vec<(Node, Rc<InputBinding>)> = bound
					.borrow()
					.iter()
					.filter(|(handle, (_, peer))| {
						**handle != node && peer.group().as_deref() == Some(group.as_str())
					})
					.map(|(_, (peer_node, peer))| (peer_node.clone(), peer.clone()))
					.collect();
				for (peer_node, peer) in peers {
					apply_controlled(&peer_node, &peer);
				}
			}
			own_binding.forward(&dispatched);
		}) as Box<dyn FnMut(web_sys::Event)>);
		target
			.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
			.map_err(js_error("bind_controlled"))?;
		self.binding_listeners
			.insert(node, (event.to_string(), listener));
		self.bound.borrow_mut().insert(node, (target, binding));
		Ok(())
	}

	fn append_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()> {
		self.node(parent)?
			.append_child(&self.node(child)?)
			.map(|_| ())
			.map_err(js_error("append_child"))
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
		self.node(parent)?
			.insert_before(&self.node(child)?, Some(&self.node(anchor)?))
			.map(|_| ())
			.map_err(js_error("insert_before"))
	}

	fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) -> SurfaceResult<()> {
		self.node(parent)?
			.remove_child(&self.node(child)?)
			.map(|_| ())
			.map_err(js_error("remove_child"))
	}

	fn replace_child(
		&mut self,
		parent: NodeHandle,
		new_child: NodeHandle,
		old_child: NodeHandle,
	) -> SurfaceResult<()> {
		self.node(parent)?
			.replace_child(&self.node(new_child)?, &self.node(old_child)?)
			.map(|_| ())
			.map_err(js_error("replace_child"))
	}

	fn child_nodes(&self, node: NodeHandle) -> SurfaceResult<Vec<NodeHandle>> {
		let list = self.node(node)?.child_nodes();
		Ok((0..list.length())
			.filter_map(|index| list.get(index))
			.map(|child| self.handle_for(&child))
			.collect())
	}

	fn parent_node(&self, node: NodeHandle) -> SurfaceResult<Option<NodeHandle>> {
		Ok(self
			.node(node)?
			.parent_node()
			.map(|parent| self.handle_for(&parent)))
	}

	fn describe(&self, node: NodeHandle) -> SurfaceResult<NodeDescriptor> {
		let target = self.node(node)?;
		Ok(match target.node_type() {
			Node::ELEMENT_NODE => match target.dyn_ref::<Element>() {
				Some(element) => NodeDescriptor::Element {
					tag: element.local_name(),
				},
				None => NodeDescriptor::Other,
			},
			Node::TEXT_NODE => NodeDescriptor::Text(target.node_value().unwrap_or_default()),
			Node::DOCUMENT_FRAGMENT_NODE => NodeDescriptor::Fragment,
			_ => NodeDescriptor::Other,
		})
	}

	fn is_document_root(&self, node: NodeHandle) -> bool {
		let Ok(target) = self.node(node) else {
			return false;
		};
		let body = self.document.body().map(Node::from);
		let root = self.document.document_element().map(Node::from);
		[body, root]
			.into_iter()
			.flatten()
			.any(|candidate| candidate.is_same_node(Some(&target)))
	}
}
