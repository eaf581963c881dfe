//! Component lifecycle integration tests
//!
//! Success Criteria:
//! 1. Class component callbacks run in mount, update and unmount order
//! 2. Deferred callbacks run after the surface is consistent
//! 3. Function component hooks fire at the matching points
//! 4. Context flows from class components to their descendants
//! 5. Component type changes tear the old component down

use reinhardt_reconciler::prelude::*;
use rstest::*;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

// ============================================================================
// Fixtures
// ============================================================================

struct Tracked {
	log: Log,
	renders: u32,
}

impl Tracked {
	fn push(&self, entry: impl Into<String>) {
		self.log.borrow_mut().push(entry.into());
	}
}

impl Component for Tracked {
	type State = u32;

	fn create(props: &Props, _context: &Context) -> Self {
		let log = props
			.get("log")
			.and_then(PropValue::downcast_ref::<Log>)
			.cloned()
			.unwrap_or_default();
		log.borrow_mut().push("create".into());
		Self { log, renders: 0 }
	}

	fn state(&self) -> &u32 {
		&self.renders
	}

	fn render(&mut self, props: &Props, _context: &Context) -> Render {
		self.renders += 1;
		self.push("render");
		let label = props.get_str("label").unwrap_or("none").to_string();
		VNode::element("span").text_content(label).into()
	}

	fn name() -> &'static str {
		"Tracked"
	}

	fn default_props() -> Option<Props> {
		Some(Props::new().with("label", "default"))
	}

	fn component_will_mount(&mut self) {
		self.push("will_mount");
	}

	fn component_did_mount(&mut self) {
		self.push("did_mount");
	}

	fn component_will_receive_props(&mut self, _next_props: &Props, _context: &Context) {
		self.push("will_receive_props");
	}

	fn should_component_update(&self, next_props: &Props) -> bool {
		self.push("should_update");
		next_props.get_str("label") != Some("frozen")
	}

	fn component_will_update(&mut self, _next_props: &Props) {
		self.push("will_update");
	}

	fn component_did_update(&mut self, _prev_props: &Props, prev_state: &u32) {
		self.push(format!("did_update {prev_state}"));
	}

	fn component_will_unmount(&mut self) {
		self.push("will_unmount");
	}
}

struct Page {
	reconciler: Reconciler<MemorySurface>,
	container: NodeHandle,
	log: Log,
	log_prop: PropValue,
}

impl Page {
	fn tracked(&self, label: Option<&'static str>) -> VNode {
		let mut props = Props::new().with("log", self.log_prop.clone());
		if let Some(label) = label {
			props.insert("label", label);
		}
		let log = self.log.clone();
		VNode::class::<Tracked>(props).node_ref(move |target| {
			let entry = if target.is_some() { "ref" } else { "ref cleared" };
			log.borrow_mut().push(entry.into());
		})
	}

	fn render(&mut self, tree: VNode) {
		self.reconciler.render(Some(tree), self.container).unwrap();
	}

	fn take_log(&self) -> Vec<String> {
		self.log.borrow_mut().drain(..).collect()
	}

	fn html(&self) -> String {
		self.reconciler.surface().inner_to_html(self.container)
	}
}

#[fixture]
fn page() -> Page {
	let mut surface = MemorySurface::new();
	let container = surface.create_container().unwrap();
	let log: Log = Rc::default();
	Page {
		reconciler: Reconciler::new(surface),
		container,
		log_prop: PropValue::data(log.clone()),
		log,
	}
}

fn consumer(_props: &Props, context: &Context) -> Render {
	let theme = context.get::<&'static str>("theme").copied().unwrap_or("light");
	VNode::element("em").text_content(theme).into()
}

const CONSUMER: FunctionComponent = FunctionComponent::new("Consumer", consumer);

struct ThemeProvider;

impl Component for ThemeProvider {
	type State = ();

	fn create(_props: &Props, _context: &Context) -> Self {
		Self
	}

	fn state(&self) -> &() {
		&()
	}

	fn render(&mut self, _props: &Props, _context: &Context) -> Render {
		VNode::element("div")
			.child(VNode::function(CONSUMER, Props::new()))
			.into()
	}

	fn name() -> &'static str {
		"ThemeProvider"
	}

	fn child_context(&self) -> Option<Context> {
		Some(Context::new().with("theme", "dark"))
	}
}

fn badge(props: &Props, _: &Context) -> Render {
	VNode::element("b")
		.text_content(props.get_str("text").unwrap_or_default().to_string())
		.into()
}

const BADGE: FunctionComponent = FunctionComponent::new("Badge", badge);

// ============================================================================
// Class Component Tests
// ============================================================================

#[rstest]
fn test_class_mount_order(mut page: Page) {
	// Act
	let tree = page.tracked(None);
	page.render(tree);

	// Assert
	assert_eq!(
		page.take_log(),
		vec!["create", "will_mount", "render", "ref", "did_mount"]
	);
	assert_eq!(page.html(), "<span>default</span>");
}

#[rstest]
fn test_class_update_order(mut page: Page) {
	// Arrange
	let tree = page.tracked(Some("a"));
	page.render(tree);
	page.take_log();

	// Act
	let tree = page.tracked(Some("b"));
	page.render(tree);

	// Assert
	assert_eq!(
		page.take_log(),
		vec![
			"will_receive_props",
			"should_update",
			"will_update",
			"render",
			"did_update 1"
		]
	);
	assert_eq!(page.html(), "<span>b</span>");
}

#[rstest]
fn test_should_update_veto_keeps_output(mut page: Page) {
	let tree = page.tracked(Some("a"));
	page.render(tree);
	page.take_log();

	let tree = page.tracked(Some("frozen"));
	page.render(tree);

	assert_eq!(page.take_log(), vec!["will_receive_props", "should_update"]);
	assert_eq!(page.html(), "<span>a</span>");
}

#[rstest]
fn test_class_unmount_order(mut page: Page) {
	let tree = page.tracked(None);
	page.render(tree);
	page.take_log();

	page.reconciler.render(None, page.container).unwrap();

	assert_eq!(page.take_log(), vec!["ref cleared", "will_unmount"]);
	assert_eq!(page.html(), "");
}

#[rstest]
fn test_instance_is_reachable(mut page: Page) {
	// Arrange
	let tree = page.tracked(Some("x"));
	page.render(tree);

	// Act
	let root = page.reconciler.root(page.container).unwrap();
	let instance = root.instance().cloned().unwrap();
	let renders = instance.with::<Tracked, u32>(|tracked| tracked.renders);

	// Assert
	assert_eq!(renders, Some(1));
	assert_eq!(instance.name(), "Tracked");
	assert_eq!(
		page.reconciler.find_instance_surface_handle(&instance),
		root.dom()
	);
}

#[rstest]
fn test_deferred_callbacks_see_attached_nodes(mut page: Page) {
	// Arrange
	let attached = Rc::new(RefCell::new(None));
	let sink = attached.clone();
	let container = page.container;
	let tree = VNode::element("div").child(VNode::element("input").node_ref(move |target| {
		if let Some(target) = target {
			*sink.borrow_mut() = target.node();
		}
	}));

	// Act
	page.render(tree);

	// Assert
	let input = attached.borrow().unwrap();
	let surface = page.reconciler.surface();
	let div = surface.parent_node(input).unwrap().unwrap();
	assert_eq!(surface.parent_node(div).unwrap(), Some(container));
}

// ============================================================================
// Function Component Tests
// ============================================================================

#[rstest]
fn test_function_hooks(mut page: Page) {
	// Arrange
	let log = page.log.clone();
	let hooks = {
		let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
		LifecycleHooks::new()
			.on_will_mount(move || a.borrow_mut().push("will_mount".into()))
			.on_did_mount(move |_| b.borrow_mut().push("did_mount".into()))
			.on_will_update(move |prev, next| {
				c.borrow_mut().push(format!(
					"will_update {}->{}",
					prev.get_str("text").unwrap_or_default(),
					next.get_str("text").unwrap_or_default()
				))
			})
			.on_did_update(move |_, _| d.borrow_mut().push("did_update".into()))
			.on_will_unmount(move || e.borrow_mut().push("will_unmount".into()))
	};
	let badge = |text: &'static str| {
		VNode::function(BADGE, Props::new().with("text", text)).hooks(hooks.clone())
	};

	// Act
	page.render(badge("one"));
	page.render(badge("two"));
	page.reconciler.render(None, page.container).unwrap();

	// Assert
	assert_eq!(
		page.take_log(),
		vec![
			"will_mount",
			"did_mount",
			"will_update one->two",
			"did_update",
			"will_unmount"
		]
	);
}

#[rstest]
fn test_function_did_mount_receives_output_node(mut page: Page) {
	let mounted = Rc::new(RefCell::new(None));
	let sink = mounted.clone();
	let tree = VNode::function(BADGE, Props::new().with("text", "hi"))
		.hooks(LifecycleHooks::new().on_did_mount(move |node| *sink.borrow_mut() = Some(node)));

	page.render(tree);

	let root = page.reconciler.root(page.container).unwrap();
	assert_eq!(*mounted.borrow(), root.dom());
	assert_eq!(page.html(), "<b>hi</b>");
}

#[rstest]
fn test_callback_ref_on_function_is_rejected() {
	let mut surface = MemorySurface::new();
	let container = surface.create_container().unwrap();
	let options = ReconcilerOptions::new().contract_mode(ContractMode::Strict);
	let mut reconciler = Reconciler::with_options(surface, options);
	let tree = VNode::function(BADGE, Props::new()).node_ref(|_| {});

	let err = reconciler.render(Some(tree), container).unwrap_err();

	assert!(matches!(
		err,
		ReconcileError::ContractViolation(ContractViolation::FunctionComponentRef { component: "Badge" })
	));
}

// ============================================================================
// Context and Type Change Tests
// ============================================================================

#[rstest]
fn test_child_context_reaches_function_descendants(mut page: Page) {
	page.render(VNode::class::<ThemeProvider>(Props::new()));

	assert_eq!(page.html(), "<div><em>dark</em></div>");
}

#[rstest]
fn test_class_to_function_swap_unmounts_class(mut page: Page) {
	// Arrange
	let tree = page.tracked(Some("a"));
	page.render(tree);
	page.take_log();

	// Act
	page.render(VNode::function(BADGE, Props::new().with("text", "b")));

	// Assert
	assert!(page.take_log().contains(&"will_unmount".to_string()));
	assert_eq!(page.html(), "<b>b</b>");
}

#[rstest]
fn test_class_type_change_replaces(mut page: Page) {
	let tree = page.tracked(Some("a"));
	page.render(tree);
	page.take_log();

	page.render(VNode::class::<ThemeProvider>(Props::new()));

	assert_eq!(page.take_log(), vec!["ref cleared", "will_unmount"]);
	assert_eq!(page.html(), "<div><em>dark</em></div>");
}
