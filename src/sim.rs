//! In-memory page with a virtual clock
//!
//! [`MemoryHost`] implements [`Dom`] and [`EventLoop`] over a plain element
//! tree so the scanner can be driven without a browser: by the test suite,
//! and by the CLI to replay a page fixture. Resolved styles follow the
//! parts of the cascade the scanner reads: inline overrides win, then the
//! element's own author color, and `color` inherits from the parent.
//! Border color falls back to the text color (`currentColor`).

use crate::controller::DarkMode;
use crate::core::{Ancestor, ElementContext, Rgb, StyleProperty};
use crate::error::DomError;
use crate::host::{Dom, EventLoop, Mutation, TimerId, Wakeup};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

pub type NodeId = usize;

const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";
const INITIAL_COLOR: &str = "rgb(0, 0, 0)";

/// Fixture description of an element and its subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    pub tag: String,
    pub class: String,
    pub id: String,
    pub background: Option<String>,
    pub background_image: Option<String>,
    pub color: Option<String>,
    pub border_color: Option<String>,
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn background(mut self, value: &str) -> Self {
        self.background = Some(value.to_string());
        self
    }

    pub fn background_image(mut self, value: &str) -> Self {
        self.background_image = Some(value.to_string());
        self
    }

    pub fn color(mut self, value: &str) -> Self {
        self.color = Some(value.to_string());
        self
    }

    pub fn border_color(mut self, value: &str) -> Self {
        self.border_color = Some(value.to_string());
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

fn default_url() -> String {
    "https://www.espn.com/".to_string()
}

/// A page to replay: its URL and element tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default = "default_url")]
    pub url: String,
    pub root: ElementSpec,
}

impl PageFixture {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn into_host(self) -> MemoryHost {
        MemoryHost::new(self.root, &self.url)
    }
}

/// Serialize a CSS value the way `getComputedStyle` would report it
fn computed(value: &str) -> String {
    let value = value.trim();
    if value.eq_ignore_ascii_case("transparent") {
        return TRANSPARENT.to_string();
    }
    match Rgb::from_hex(value) {
        Some(c) => format!("rgb({}, {}, {})", c.r, c.g, c.b),
        None => value.to_string(),
    }
}

struct Element {
    tag: String,
    class: String,
    id: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
    background: Option<String>,
    background_image: Option<String>,
    color: Option<String>,
    border_color: Option<String>,
    inline: BTreeMap<StyleProperty, String>,
    /// A `style` attribute exists (it stays, possibly empty, once written)
    has_style_attr: bool,
}

struct VirtualTimer {
    due: u64,
    period: Option<u64>,
}

/// Inline overrides of one element, for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementReport {
    pub path: String,
    pub tag: String,
    pub class: String,
    pub overrides: BTreeMap<&'static str, String>,
}

pub struct MemoryHost {
    elements: Vec<Element>,
    root: NodeId,
    location: String,
    stylesheets: BTreeMap<String, String>,
    loading: bool,
    ready_requested: bool,
    now_ms: u64,
    next_timer: u32,
    timers: BTreeMap<TimerId, VirtualTimer>,
    observing: bool,
    pending: Vec<Mutation<NodeId>>,
    queued: VecDeque<Wakeup<NodeId>>,
    observer_connects: usize,
}

impl MemoryHost {
    pub fn new(root: ElementSpec, location: &str) -> Self {
        let mut host = Self {
            elements: Vec::new(),
            root: 0,
            location: location.to_string(),
            stylesheets: BTreeMap::new(),
            loading: false,
            ready_requested: false,
            now_ms: 0,
            next_timer: 1,
            timers: BTreeMap::new(),
            observing: false,
            pending: Vec::new(),
            queued: VecDeque::new(),
            observer_connects: 0,
        };
        host.root = host.build(&root, None);
        host
    }

    /// Page whose document is still parsing
    pub fn loading(root: ElementSpec, location: &str) -> Self {
        let mut host = Self::new(root, location);
        host.loading = true;
        host
    }

    fn build(&mut self, spec: &ElementSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.elements.len();
        let attached = parent.map_or(true, |p| self.elements[p].attached);
        self.elements.push(Element {
            tag: spec.tag.to_ascii_uppercase(),
            class: spec.class.clone(),
            id: spec.id.clone(),
            parent,
            children: Vec::new(),
            attached,
            background: spec.background.clone(),
            background_image: spec.background_image.clone(),
            color: spec.color.clone(),
            border_color: spec.border_color.clone(),
            inline: BTreeMap::new(),
            has_style_attr: false,
        });
        for child in &spec.children {
            let child_id = self.build(child, Some(id));
            self.elements[id].children.push(child_id);
        }
        id
    }

    fn record(&mut self, mutation: Mutation<NodeId>) {
        if self.observing {
            self.pending.push(mutation);
        }
    }

    // === Page-side mutations ===

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Insert `spec` as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let id = self.build(&spec, Some(parent));
        self.elements[parent].children.push(id);
        if self.elements[id].attached {
            self.record(Mutation::Added(id));
        }
        id
    }

    pub fn set_class(&mut self, node: NodeId, class: &str) {
        self.elements[node].class = class.to_string();
        self.record(Mutation::Attribute(node));
    }

    /// The page restyles an element (reported as a `style` change)
    pub fn set_background(&mut self, node: NodeId, value: &str) {
        self.elements[node].background = Some(value.to_string());
        self.record(Mutation::Attribute(node));
    }

    /// Remove `node` and its subtree from the document
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.elements[node].parent {
            self.elements[parent].children.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            self.elements[n].attached = false;
            stack.extend(self.elements[n].children.iter().copied());
        }
    }

    /// Client-side route change
    pub fn navigate(&mut self, url: &str) {
        self.location = url.to_string();
    }

    /// Parsing finished; fires DOM-ready if it was requested
    pub fn finish_loading(&mut self) {
        self.loading = false;
        if std::mem::take(&mut self.ready_requested) {
            self.queued.push_back(Wakeup::DomReady);
        }
    }

    // === Inspection ===

    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.walk(self.root).into_iter().find(|&n| self.elements[n].id == id)
    }

    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.walk(self.root)
            .into_iter()
            .filter(|&n| self.elements[n].class.split_whitespace().any(|c| c == class))
            .collect()
    }

    pub fn inline(&self, node: NodeId, property: StyleProperty) -> Option<&str> {
        self.elements[node].inline.get(&property).map(String::as_str)
    }

    /// Attached elements carrying any inline override
    pub fn overridden_count(&self) -> usize {
        self.walk(self.root)
            .into_iter()
            .filter(|&n| !self.elements[n].inline.is_empty())
            .count()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Times the mutation subscription was opened
    pub fn observer_connects(&self) -> usize {
        self.observer_connects
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    /// Every attached element with inline overrides, in document order
    pub fn report(&self) -> Vec<ElementReport> {
        self.walk(self.root)
            .into_iter()
            .filter(|&n| !self.elements[n].inline.is_empty())
            .map(|n| {
                let el = &self.elements[n];
                ElementReport {
                    path: self.path(n),
                    tag: el.tag.clone(),
                    class: el.class.clone(),
                    overrides: el
                        .inline
                        .iter()
                        .map(|(p, v)| (p.css_name(), v.clone()))
                        .collect(),
                }
            })
            .collect()
    }

    fn path(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(node);
        while let Some(n) = cur {
            let el = &self.elements[n];
            let index = el
                .parent
                .and_then(|p| self.elements[p].children.iter().position(|&c| c == n));
            parts.push(match index {
                Some(i) => format!("{}[{}]", el.tag.to_ascii_lowercase(), i),
                None => el.tag.to_ascii_lowercase(),
            });
            cur = el.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// `node` and its attached descendants, depth first
    fn walk(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.elements[node].attached {
            return out;
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.elements[n].children.iter().rev().copied());
        }
        out
    }

    fn resolved_background(&self, node: NodeId) -> String {
        let el = &self.elements[node];
        match el.inline.get(&StyleProperty::BackgroundColor) {
            Some(v) => computed(v),
            None => el.background.as_deref().map_or_else(|| TRANSPARENT.to_string(), computed),
        }
    }

    fn resolved_image(&self, node: NodeId) -> String {
        let el = &self.elements[node];
        el.inline
            .get(&StyleProperty::BackgroundImage)
            .or(el.background_image.as_ref())
            .cloned()
            .unwrap_or_else(|| "none".to_string())
    }

    fn resolved_color(&self, node: NodeId) -> String {
        let mut cur = Some(node);
        while let Some(n) = cur {
            let el = &self.elements[n];
            if let Some(v) = el.inline.get(&StyleProperty::Color).or(el.color.as_ref()) {
                return computed(v);
            }
            cur = el.parent;
        }
        INITIAL_COLOR.to_string()
    }

    fn resolved_border(&self, node: NodeId) -> String {
        let el = &self.elements[node];
        match el.inline.get(&StyleProperty::BorderColor).or(el.border_color.as_ref()) {
            Some(v) => computed(v),
            None => self.resolved_color(node),
        }
    }

    /// Next callback due no later than `until`, advancing the clock to it.
    ///
    /// Queued DOM-ready and pending mutation records run before timers,
    /// the way microtasks do.
    pub fn next_wakeup(&mut self, until: u64) -> Option<Wakeup<NodeId>> {
        if let Some(w) = self.queued.pop_front() {
            return Some(w);
        }
        if !self.pending.is_empty() {
            return Some(Wakeup::Mutations(std::mem::take(&mut self.pending)));
        }
        let (id, due, period) = self
            .timers
            .iter()
            .map(|(&id, t)| (id, t.due, t.period))
            .min_by_key(|&(id, due, _)| (due, id))?;
        if due > until {
            return None;
        }
        self.now_ms = due;
        match period {
            Some(period) => {
                if let Some(t) = self.timers.get_mut(&id) {
                    t.due += period;
                }
            }
            None => {
                self.timers.remove(&id);
            }
        }
        Some(Wakeup::Timer(id))
    }

    fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn add_timer(&mut self, delay: u64, period: Option<u64>) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(
            id,
            VirtualTimer {
                due: self.now_ms + delay,
                period,
            },
        );
        id
    }
}

impl Dom for MemoryHost {
    type Node = NodeId;

    fn all_elements(&self) -> Vec<NodeId> {
        self.walk(self.root)
    }

    fn descendants(&self, root: &NodeId) -> Vec<NodeId> {
        let mut nodes = self.walk(*root);
        if !nodes.is_empty() {
            nodes.remove(0);
        }
        nodes
    }

    fn child_element_count(&self, node: &NodeId) -> usize {
        self.elements[*node].children.len()
    }

    fn inspect(&self, node: &NodeId) -> Result<ElementContext, DomError> {
        let el = self.elements.get(*node).ok_or(DomError::Detached)?;
        if !el.attached {
            return Err(DomError::Detached);
        }

        let mut ancestors = Vec::new();
        let mut cur = el.parent;
        while let Some(p) = cur {
            let a = &self.elements[p];
            ancestors.push(Ancestor {
                tag: a.tag.clone(),
                class_name: a.class.clone(),
                id: a.id.clone(),
            });
            cur = a.parent;
        }

        let sibling_index = el
            .parent
            .and_then(|p| self.elements[p].children.iter().position(|&c| c == *node))
            .unwrap_or(0);

        Ok(ElementContext {
            tag: el.tag.clone(),
            class_name: el.class.clone(),
            id: el.id.clone(),
            background_color: self.resolved_background(*node),
            background_image: self.resolved_image(*node),
            color: self.resolved_color(*node),
            border_color: self.resolved_border(*node),
            parent_tag: el.parent.map(|p| self.elements[p].tag.clone()),
            sibling_index,
            ancestors,
        })
    }

    fn inline_style(&self, node: &NodeId, property: StyleProperty) -> Option<String> {
        self.elements[*node].inline.get(&property).cloned()
    }

    fn set_inline_important(&mut self, node: &NodeId, property: StyleProperty, value: &str) {
        let el = &mut self.elements[*node];
        el.has_style_attr = true;
        let previous = el.inline.insert(property, value.to_string());
        if previous.as_deref() != Some(value) {
            self.record(Mutation::Attribute(*node));
        }
    }

    fn remove_inline(&mut self, node: &NodeId, property: StyleProperty) {
        if self.elements[*node].inline.remove(&property).is_some() {
            self.record(Mutation::Attribute(*node));
        }
    }

    fn styled_elements(&self) -> Vec<NodeId> {
        self.walk(self.root)
            .into_iter()
            .filter(|&n| self.elements[n].has_style_attr)
            .collect()
    }

    fn has_stylesheet(&self, id: &str) -> bool {
        self.stylesheets.contains_key(id)
    }

    fn insert_stylesheet(&mut self, id: &str, css: &str) {
        self.stylesheets.insert(id.to_string(), css.to_string());
    }

    fn remove_stylesheet(&mut self, id: &str) {
        self.stylesheets.remove(id);
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn request_dom_ready(&mut self) {
        if self.loading {
            self.ready_requested = true;
        } else {
            self.queued.push_back(Wakeup::DomReady);
        }
    }
}

impl EventLoop for MemoryHost {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId {
        self.add_timer(delay_ms as u64, None)
    }

    fn set_interval(&mut self, period_ms: u32) -> TimerId {
        let period = (period_ms as u64).max(1);
        self.add_timer(period, Some(period))
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn observe_mutations(&mut self) {
        self.observing = true;
        self.observer_connects += 1;
    }

    fn disconnect_mutations(&mut self) {
        self.observing = false;
        self.pending.clear();
    }
}

impl DarkMode<MemoryHost> {
    /// Run every callback due within the next `ms` of virtual time.
    ///
    /// Returns the number of callbacks delivered.
    pub fn advance(&mut self, ms: u64) -> usize {
        let until = self.host().now_ms() + ms;
        let mut delivered = 0;
        while let Some(wakeup) = self.host_mut().next_wakeup(until) {
            self.dispatch(wakeup);
            delivered += 1;
        }
        self.host_mut().set_now(until);
        delivered
    }

    /// Deliver queued callbacks without moving the clock
    pub fn settle(&mut self) -> usize {
        self.advance(0)
    }
}
