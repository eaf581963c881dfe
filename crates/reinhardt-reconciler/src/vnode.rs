//! Virtual nodes.
//!
//! A [`VNode`] is an immutable description of a piece of UI plus the runtime slots the
//! reconciler fills in while mounting: the surface handle, the class component
//! instance, or a function component's last rendered output.
//!
//! ## Kinds
//!
//! | Kind | Builder | Surface footprint |
//! |------|---------|-------------------|
//! | Text | [`VNode::text`] | one text node |
//! | Void | [`VNode::void`] | one empty text placeholder |
//! | Element | [`VNode::element`] | one element |
//! | Fragment | [`VNode::fragment`] | its children plus an empty end marker |
//! | Class component | [`VNode::class`] | whatever it renders |
//! | Function component | [`VNode::function`] | whatever it renders |
//!
//! ## Example
//!
//! ```
//! use reinhardt_reconciler::vnode::{Style, VNode};
//!
//! let list = VNode::element("ul")
//! 	.class_name("todos")
//! 	.keyed_children()
//! 	.children(["write", "test", "ship"].map(|item| {
//! 		VNode::element("li").key(item).text_content(item)
//! 	}));
//!
//! assert_eq!(list.child_nodes().len(), 3);
//! ```
//!
//! Cloning a node copies its description only. The clone is unmounted and can be
//! mounted anywhere.

mod children;
mod props;
mod refs;

pub use children::{Child, normalize_children};
pub use props::{PropValue, Props, RESERVED_PROPS, Style, StyleValue};
pub use refs::{NodeRef, RefCallback, RefTarget};

use crate::component::{
	ClassComponent, Component, ComponentInstance, ComponentType, FunctionComponent,
	LifecycleHooks,
};
use crate::surface::{Event, NodeHandle};
use std::borrow::Cow;
use std::fmt;

/// Identity of a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	/// Integer key
	Int(i64),
	/// String key
	Str(Cow<'static, str>),
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(value) => write!(f, "{value}"),
			Self::Str(value) => write!(f, "{value}"),
		}
	}
}

impl From<&'static str> for Key {
	fn from(value: &'static str) -> Self {
		Self::Str(Cow::Borrowed(value))
	}
}

impl From<String> for Key {
	fn from(value: String) -> Self {
		Self::Str(Cow::Owned(value))
	}
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<i32> for Key {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<u32> for Key {
	fn from(value: u32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<usize> for Key {
	fn from(value: usize) -> Self {
		match i64::try_from(value) {
			Ok(value) => Self::Int(value),
			Err(_) => Self::Str(Cow::Owned(value.to_string())),
		}
	}
}

/// Public view of a node's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VNodeKind {
	/// Text leaf
	Text,
	/// Placeholder for "nothing"
	Void,
	/// Element
	Element,
	/// Sequence of siblings without a wrapper
	Fragment,
	/// Stateful component with an instance
	ClassComponent,
	/// Stateless render function
	FunctionComponent,
}

impl VNodeKind {
	/// Whether the kind is an element.
	pub fn is_element(self) -> bool {
		matches!(self, Self::Element)
	}

	/// Whether the kind is one of the component kinds.
	pub fn is_component(self) -> bool {
		matches!(self, Self::ClassComponent | Self::FunctionComponent)
	}

	/// Kinds that can be patched into each other. Both component kinds share one
	/// family since a class can be swapped for a function in place.
	pub(crate) fn family(self) -> u8 {
		match self {
			Self::Text => 0,
			Self::Void => 1,
			Self::Element => 2,
			Self::Fragment => 3,
			Self::ClassComponent | Self::FunctionComponent => 4,
		}
	}
}

/// Element specializations that change how an element is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementFlavor {
	/// Plain HTML element
	#[default]
	Html,
	/// SVG element; the namespace propagates to descendants
	Svg,
	/// `<input>`, may become a controlled input
	Input,
	/// `<textarea>`, may become a controlled input
	TextArea,
}

impl ElementFlavor {
	fn for_tag(tag: &str) -> Self {
		match tag {
			"svg" => Self::Svg,
			"input" => Self::Input,
			"textarea" => Self::TextArea,
			_ => Self::Html,
		}
	}

	/// Whether value/checked props pin the element's state.
	pub fn is_controllable(self) -> bool {
		matches!(self, Self::Input | Self::TextArea)
	}
}

/// Hint describing the keys of an element's or fragment's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildFlags {
	/// Decide by inspecting the first child on each side
	#[default]
	Unknown,
	/// Every child carries a key
	Keyed,
	/// No child carries a key
	NonKeyed,
}

/// Children of an element.
#[derive(Debug, Clone, Default)]
pub enum Children {
	/// No children
	#[default]
	None,
	/// Text content, set directly on the element
	Text(Cow<'static, str>),
	/// A single child node
	Single(Box<VNode>),
	/// A list of child nodes
	Many(Vec<VNode>),
}

impl Children {
	fn into_list(self) -> Vec<VNode> {
		match self {
			Self::None => Vec::new(),
			Self::Text(text) => vec![VNode::text(text)],
			Self::Single(node) => vec![*node],
			Self::Many(list) => list,
		}
	}
}

/// Element payload.
#[derive(Debug, Clone)]
pub struct ElementNode {
	pub(crate) tag: Cow<'static, str>,
	pub(crate) flavor: ElementFlavor,
	pub(crate) props: Props,
	pub(crate) children: Children,
	pub(crate) child_flags: ChildFlags,
	pub(crate) node_ref: Option<NodeRef>,
}

/// Fragment payload.
#[derive(Debug, Clone, Default)]
pub struct FragmentNode {
	pub(crate) children: Vec<VNode>,
	pub(crate) child_flags: ChildFlags,
}

/// Class component payload.
pub struct ClassNode {
	pub(crate) component: ClassComponent,
	pub(crate) props: Props,
	pub(crate) node_ref: Option<NodeRef>,
	pub(crate) instance: Option<ComponentInstance>,
}

impl Clone for ClassNode {
	fn clone(&self) -> Self {
		Self {
			component: self.component,
			props: self.props.clone(),
			node_ref: self.node_ref.clone(),
			instance: None,
		}
	}
}

impl fmt::Debug for ClassNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClassNode")
			.field("component", &self.component.name())
			.field("props", &self.props)
			.field("instance", &self.instance)
			.finish()
	}
}

/// Function component payload.
pub struct FunctionNode {
	pub(crate) component: FunctionComponent,
	pub(crate) props: Props,
	pub(crate) node_ref: Option<NodeRef>,
	pub(crate) rendered: Option<Box<VNode>>,
}

impl FunctionNode {
	pub(crate) fn hooks(&self) -> Option<&LifecycleHooks> {
		match &self.node_ref {
			Some(NodeRef::Hooks(hooks)) => Some(hooks),
			_ => None,
		}
	}
}

impl Clone for FunctionNode {
	fn clone(&self) -> Self {
		Self {
			component: self.component,
			props: self.props.clone(),
			node_ref: self.node_ref.clone(),
			rendered: None,
		}
	}
}

impl fmt::Debug for FunctionNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FunctionNode")
			.field("component", &self.component.name())
			.field("props", &self.props)
			.field("rendered", &self.rendered)
			.finish()
	}
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
	Text(Cow<'static, str>),
	Void,
	Element(ElementNode),
	Fragment(FragmentNode),
	Class(ClassNode),
	Function(FunctionNode),
}

/// A virtual node.
#[derive(Debug)]
pub struct VNode {
	pub(crate) kind: NodeKind,
	pub(crate) key: Option<Key>,
	pub(crate) dom: Option<NodeHandle>,
}

impl Clone for VNode {
	fn clone(&self) -> Self {
		Self {
			kind: self.kind.clone(),
			key: self.key.clone(),
			dom: None,
		}
	}
}

impl VNode {
	fn new(kind: NodeKind) -> Self {
		Self {
			kind,
			key: None,
			dom: None,
		}
	}

	/// Creates a text node.
	pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
		Self::new(NodeKind::Text(text.into()))
	}

	/// Creates a placeholder that renders nothing visible.
	pub fn void() -> Self {
		Self::new(NodeKind::Void)
	}

	/// Creates an element.
	pub fn element(tag: impl Into<Cow<'static, str>>) -> Self {
		let tag = tag.into();
		Self::new(NodeKind::Element(ElementNode {
			flavor: ElementFlavor::for_tag(&tag),
			tag,
			props: Props::new(),
			children: Children::None,
			child_flags: ChildFlags::Unknown,
			node_ref: None,
		}))
	}

	/// Creates a fragment.
	pub fn fragment<I>(children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		Self::new(NodeKind::Fragment(FragmentNode {
			children: normalize_children(children),
			child_flags: ChildFlags::Unknown,
		}))
	}

	/// Creates a class component node.
	pub fn class<C: Component>(props: Props) -> Self {
		Self::new(NodeKind::Class(ClassNode {
			component: ClassComponent::of::<C>(),
			props,
			node_ref: None,
			instance: None,
		}))
	}

	/// Creates a function component node.
	pub fn function(component: FunctionComponent, props: Props) -> Self {
		Self::new(NodeKind::Function(FunctionNode {
			component,
			props,
			node_ref: None,
			rendered: None,
		}))
	}

	/// Sets the key.
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Sets a property. `key` is routed to [`VNode::key`].
	pub fn prop(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<PropValue>) -> Self {
		let name = name.into();
		let value = value.into();
		if name == "key" {
			self.key = match value {
				PropValue::Int(key) => Some(Key::Int(key)),
				PropValue::Str(key) => Some(Key::Str(key)),
				PropValue::Null => None,
				other => Some(Key::Str(Cow::Owned(other.to_attribute_string()))),
			};
			return self;
		}
		match self.props_mut() {
			Some(props) => props.insert(name, value),
			None => tracing::debug!(prop = %name, "props ignored on a node without props"),
		}
		self
	}

	/// Merges a property bag into the node's props.
	pub fn props(mut self, props: Props) -> Self {
		for (name, value) in props.iter() {
			self = self.prop(name.to_string(), value.clone());
		}
		self
	}

	/// Sets `className`.
	pub fn class_name(self, class: impl Into<Cow<'static, str>>) -> Self {
		self.prop("className", PropValue::Str(class.into()))
	}

	/// Sets the inline style map.
	pub fn style(self, style: Style) -> Self {
		self.prop("style", style)
	}

	/// Installs an event handler for `event` (`"click"`, `"input"`, ...).
	pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
		self.prop(format!("on{event}"), PropValue::handler(handler))
	}

	/// Appends a child to an element or fragment.
	pub fn child(self, child: impl Into<Child>) -> Self {
		self.children([child.into()])
	}

	/// Appends children to an element or fragment.
	pub fn children<I>(mut self, children: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<Child>,
	{
		let nodes = normalize_children(children);
		match &mut self.kind {
			NodeKind::Element(element) => {
				let mut list = std::mem::take(&mut element.children).into_list();
				list.extend(nodes);
				element.children = Children::Many(list);
			}
			NodeKind::Fragment(fragment) => fragment.children.extend(nodes),
			_ => tracing::debug!("children ignored on a node that cannot hold them"),
		}
		self
	}

	/// Sets an element's children to a single text content.
	pub fn text_content(mut self, text: impl Into<Cow<'static, str>>) -> Self {
		if let NodeKind::Element(element) = &mut self.kind {
			element.children = Children::Text(text.into());
		}
		self
	}

	/// Sets an element's children to exactly one node.
	pub fn only_child(mut self, child: VNode) -> Self {
		if let NodeKind::Element(element) = &mut self.kind {
			element.children = Children::Single(Box::new(child));
		}
		self
	}

	/// Declares that every child carries a key.
	pub fn keyed_children(mut self) -> Self {
		self.set_child_flags(ChildFlags::Keyed);
		self
	}

	/// Declares that no child carries a key.
	pub fn non_keyed_children(mut self) -> Self {
		self.set_child_flags(ChildFlags::NonKeyed);
		self
	}

	/// Forces the SVG namespace for this element and its descendants.
	pub fn svg(mut self) -> Self {
		if let NodeKind::Element(element) = &mut self.kind {
			element.flavor = ElementFlavor::Svg;
		}
		self
	}

	/// Attaches a callback ref.
	pub fn node_ref(self, callback: impl Fn(Option<RefTarget>) + 'static) -> Self {
		self.with_ref(NodeRef::callback(callback))
	}

	/// Attaches a lifecycle hook bag.
	pub fn hooks(self, hooks: LifecycleHooks) -> Self {
		self.with_ref(NodeRef::Hooks(hooks))
	}

	/// Sets the ref slot.
	pub fn with_ref(mut self, node_ref: NodeRef) -> Self {
		match &mut self.kind {
			NodeKind::Element(element) => element.node_ref = Some(node_ref),
			NodeKind::Class(class) => class.node_ref = Some(node_ref),
			NodeKind::Function(function) => function.node_ref = Some(node_ref),
			_ => tracing::debug!("ref ignored on a node that cannot hold one"),
		}
		self
	}

	/// The node's kind.
	pub fn kind(&self) -> VNodeKind {
		match &self.kind {
			NodeKind::Text(_) => VNodeKind::Text,
			NodeKind::Void => VNodeKind::Void,
			NodeKind::Element(_) => VNodeKind::Element,
			NodeKind::Fragment(_) => VNodeKind::Fragment,
			NodeKind::Class(_) => VNodeKind::ClassComponent,
			NodeKind::Function(_) => VNodeKind::FunctionComponent,
		}
	}

	/// The key, if any.
	pub fn node_key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	/// Surface handle assigned while mounted.
	///
	/// For fragments this is the trailing end marker. For components it is the
	/// handle of the rendered output.
	pub fn dom(&self) -> Option<NodeHandle> {
		self.dom
	}

	/// Whether the node currently has a surface handle.
	pub fn is_mounted(&self) -> bool {
		self.dom.is_some()
	}

	/// Tag of an element.
	pub fn tag_name(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Element(element) => Some(&element.tag),
			_ => None,
		}
	}

	/// Content of a text node, or the text content of an element.
	pub fn text_value(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Text(text) => Some(text),
			NodeKind::Element(ElementNode {
				children: Children::Text(text),
				..
			}) => Some(text),
			_ => None,
		}
	}

	/// Props of an element or component.
	pub fn node_props(&self) -> Option<&Props> {
		match &self.kind {
			NodeKind::Element(element) => Some(&element.props),
			NodeKind::Class(class) => Some(&class.props),
			NodeKind::Function(function) => Some(&function.props),
			_ => None,
		}
	}

	/// Child nodes of an element or fragment.
	pub fn child_nodes(&self) -> &[VNode] {
		match &self.kind {
			NodeKind::Element(element) => match &element.children {
				Children::Single(child) => std::slice::from_ref(child.as_ref()),
				Children::Many(list) => list,
				Children::None | Children::Text(_) => &[],
			},
			NodeKind::Fragment(fragment) => &fragment.children,
			_ => &[],
		}
	}

	/// Instance of a mounted class component.
	pub fn instance(&self) -> Option<&ComponentInstance> {
		match &self.kind {
			NodeKind::Class(class) => class.instance.as_ref(),
			_ => None,
		}
	}

	pub(crate) fn component_type(&self) -> Option<ComponentType> {
		match &self.kind {
			NodeKind::Class(class) => Some(class.component.component_type()),
			NodeKind::Function(function) => Some(function.component.component_type()),
			_ => None,
		}
	}

	fn props_mut(&mut self) -> Option<&mut Props> {
		match &mut self.kind {
			NodeKind::Element(element) => Some(&mut element.props),
			NodeKind::Class(class) => Some(&mut class.props),
			NodeKind::Function(function) => Some(&mut function.props),
			_ => None,
		}
	}

	fn set_child_flags(&mut self, flags: ChildFlags) {
		match &mut self.kind {
			NodeKind::Element(element) => element.child_flags = flags,
			NodeKind::Fragment(fragment) => fragment.child_flags = flags,
			_ => {}
		}
	}
}

impl From<&'static str> for VNode {
	fn from(text: &'static str) -> Self {
		Self::text(text)
	}
}

impl From<String> for VNode {
	fn from(text: String) -> Self {
		Self::text(text)
	}
}
