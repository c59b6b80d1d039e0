//! Browser host and extension entry points
//!
//! [`WebHost`] binds the core to the live page through `web-sys`. Timer and
//! observer callbacks are `Closure`s that feed [`Wakeup`]s back into the
//! shared [`DarkMode`] through a [`Dispatcher`].
//!
//! Exports, called from the extension's JS loaders:
//! - `run_content_script` (content script, `document_start`)
//! - `on_installed` (background service worker)
//! - `popup_read_enabled` / `popup_set_enabled` / `status_label` (popup)

use crate::config::{ScanSchedule, HOST_TAB_PATTERN};
use crate::controller::DarkMode;
use crate::core::{Ancestor, ElementContext, StyleProperty};
use crate::error::DomError;
use crate::host::{Dom, EventLoop, Mutation, TimerId, Wakeup};
use crate::toggle::{self, FlagStore, Settings};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, Document, Element, HtmlElement, MutationObserver,
    MutationObserverInit, MutationRecord, Node, Window,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(defaults: &JsValue, callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set)]
    fn storage_sync_set(items: &JsValue);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn runtime_on_message(callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query: &JsValue, callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    fn tabs_send_message(tab_id: f64, message: &JsValue) -> js_sys::Promise;
}

fn to_json(value: &JsValue) -> Option<String> {
    js_sys::JSON::stringify(value).ok().map(String::from)
}

fn from_json(json: &str) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(json)
}

/// Routes host callbacks into the shared controller
#[derive(Clone, Default)]
struct Dispatcher(Rc<RefCell<Weak<RefCell<DarkMode<WebHost>>>>>);

impl Dispatcher {
    fn bind(&self, target: &Rc<RefCell<DarkMode<WebHost>>>) {
        *self.0.borrow_mut() = Rc::downgrade(target);
    }

    fn send(&self, wakeup: Wakeup<Element>) {
        let Some(target) = self.0.borrow().upgrade() else {
            return;
        };
        let Ok(mut dm) = target.try_borrow_mut() else {
            warn!("Callback while the controller is busy, dropped");
            return;
        };
        dm.host_mut().begin_callback(&wakeup);
        dm.dispatch(wakeup);
    }
}

struct BrowserTimer {
    handle: i32,
    repeating: bool,
    _callback: Closure<dyn FnMut()>,
}

pub struct WebHost {
    window: Window,
    document: Document,
    dispatcher: Dispatcher,
    next_timer: u32,
    timers: HashMap<TimerId, BrowserTimer>,
    /// Callbacks that may still be on the stack; dropped at the next callback
    retired: Vec<BrowserTimer>,
    observer: Option<(MutationObserver, Closure<dyn FnMut(js_sys::Array)>)>,
}

impl WebHost {
    fn new(window: Window, document: Document, dispatcher: Dispatcher) -> Self {
        Self {
            window,
            document,
            dispatcher,
            next_timer: 1,
            timers: HashMap::new(),
            retired: Vec::new(),
            observer: None,
        }
    }

    /// Drop closures retired during earlier callbacks, and retire the
    /// one-shot timer about to run
    fn begin_callback(&mut self, wakeup: &Wakeup<Element>) {
        self.retired.clear();
        if let Wakeup::Timer(id) = wakeup {
            if self.timers.get(id).is_some_and(|t| !t.repeating) {
                if let Some(timer) = self.timers.remove(id) {
                    self.retired.push(timer);
                }
            }
        }
    }

    fn schedule(&mut self, delay_ms: u32, repeating: bool) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;

        let dispatcher = self.dispatcher.clone();
        let callback = Closure::wrap(Box::new(move || {
            dispatcher.send(Wakeup::Timer(id));
        }) as Box<dyn FnMut()>);

        let f = callback.as_ref().unchecked_ref();
        let delay = delay_ms.min(i32::MAX as u32) as i32;
        let handle = if repeating {
            self.window
                .set_interval_with_callback_and_timeout_and_arguments_0(f, delay)
        } else {
            self.window
                .set_timeout_with_callback_and_timeout_and_arguments_0(f, delay)
        };

        match handle {
            Ok(handle) => {
                self.timers.insert(
                    id,
                    BrowserTimer {
                        handle,
                        repeating,
                        _callback: callback,
                    },
                );
            }
            Err(e) => error!(?e, %id, "Failed to schedule timer"),
        }
        id
    }

    fn style_of(node: &Element) -> Option<web_sys::CssStyleDeclaration> {
        node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }

    fn elements_in(collection: web_sys::HtmlCollection) -> Vec<Element> {
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .collect()
    }
}

/// `class` attribute text; `className` is an object on SVG elements
fn class_of(node: &Element) -> String {
    node.get_attribute("class").unwrap_or_default()
}

impl Dom for WebHost {
    type Node = Element;

    fn all_elements(&self) -> Vec<Element> {
        Self::elements_in(self.document.get_elements_by_tag_name("*"))
    }

    fn descendants(&self, root: &Element) -> Vec<Element> {
        Self::elements_in(root.get_elements_by_tag_name("*"))
    }

    fn child_element_count(&self, node: &Element) -> usize {
        node.child_element_count() as usize
    }

    fn inspect(&self, node: &Element) -> Result<ElementContext, DomError> {
        if !node.is_connected() {
            return Err(DomError::Detached);
        }
        let style = self
            .window
            .get_computed_style(node)
            .map_err(|e| DomError::StyleUnavailable(format!("{e:?}")))?
            .ok_or_else(|| DomError::StyleUnavailable("no computed style".into()))?;
        let read = |property: StyleProperty| {
            style
                .get_property_value(property.computed_name())
                .map_err(|e| DomError::StyleUnavailable(format!("{e:?}")))
        };

        let mut ancestors = Vec::new();
        let mut cur = node.parent_element();
        while let Some(parent) = cur {
            ancestors.push(Ancestor {
                tag: parent.tag_name(),
                class_name: class_of(&parent),
                id: parent.id(),
            });
            cur = parent.parent_element();
        }

        let mut sibling_index = 0;
        let mut prev = node.previous_element_sibling();
        while let Some(sibling) = prev {
            sibling_index += 1;
            prev = sibling.previous_element_sibling();
        }

        Ok(ElementContext {
            tag: node.tag_name(),
            class_name: class_of(node),
            id: node.id(),
            background_color: read(StyleProperty::BackgroundColor)?,
            background_image: read(StyleProperty::BackgroundImage)?,
            color: read(StyleProperty::Color)?,
            border_color: read(StyleProperty::BorderColor)?,
            parent_tag: node.parent_element().map(|p| p.tag_name()),
            sibling_index,
            ancestors,
        })
    }

    fn inline_style(&self, node: &Element, property: StyleProperty) -> Option<String> {
        Self::style_of(node)?
            .get_property_value(property.css_name())
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn set_inline_important(&mut self, node: &Element, property: StyleProperty, value: &str) {
        if let Some(style) = Self::style_of(node) {
            let name = property.css_name();
            if let Err(e) = style.set_property_with_priority(name, value, "important") {
                debug!(?e, property = name, "Inline write rejected");
            }
        }
    }

    fn remove_inline(&mut self, node: &Element, property: StyleProperty) {
        if let Some(style) = Self::style_of(node) {
            let name = property.css_name();
            if let Err(e) = style.remove_property(name) {
                debug!(?e, property = name, "Inline removal rejected");
            }
        }
    }

    fn styled_elements(&self) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all("[style]") else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect()
    }

    fn has_stylesheet(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn insert_stylesheet(&mut self, id: &str, css: &str) {
        // `head` may not exist yet at document start
        let parent = self
            .document
            .head()
            .map(Element::from)
            .or_else(|| self.document.document_element());
        let Some(parent) = parent else {
            warn!("No document element to attach the stylesheet to");
            return;
        };
        match self.document.create_element("style") {
            Ok(style) => {
                style.set_id(id);
                style.set_text_content(Some(css));
                if let Err(e) = parent.append_child(&style) {
                    error!(?e, "Failed to attach stylesheet");
                }
            }
            Err(e) => error!(?e, "Failed to create stylesheet element"),
        }
    }

    fn remove_stylesheet(&mut self, id: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.remove();
        }
    }

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }

    fn request_dom_ready(&mut self) {
        let dispatcher = self.dispatcher.clone();
        let callback = Closure::once_into_js(move || dispatcher.send(Wakeup::DomReady));
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(e) = self
            .document
            .add_event_listener_with_callback_and_add_event_listener_options(
                "DOMContentLoaded",
                callback.unchecked_ref(),
                &options,
            )
        {
            error!(?e, "Failed to listen for DOMContentLoaded");
        }
    }
}

fn mutations_from(records: &js_sys::Array) -> Vec<Mutation<Element>> {
    let mut out = Vec::new();
    for record in records.iter() {
        let Ok(record) = record.dyn_into::<MutationRecord>() else {
            continue;
        };
        if record.type_() == "childList" {
            let added = record.added_nodes();
            for i in 0..added.length() {
                let Some(node) = added.item(i) else { continue };
                if node.node_type() == Node::ELEMENT_NODE {
                    if let Ok(el) = node.dyn_into::<Element>() {
                        out.push(Mutation::Added(el));
                    }
                }
            }
        } else if let Some(target) = record.target() {
            if let Ok(el) = target.dyn_into::<Element>() {
                out.push(Mutation::Attribute(el));
            }
        }
    }
    out
}

impl EventLoop for WebHost {
    fn set_timeout(&mut self, delay_ms: u32) -> TimerId {
        self.schedule(delay_ms, false)
    }

    fn set_interval(&mut self, period_ms: u32) -> TimerId {
        self.schedule(period_ms, true)
    }

    fn clear_timer(&mut self, id: TimerId) {
        let Some(timer) = self.timers.remove(&id) else {
            return;
        };
        if timer.repeating {
            self.window.clear_interval_with_handle(timer.handle);
        } else {
            self.window.clear_timeout_with_handle(timer.handle);
        }
        // May be the interval currently running
        self.retired.push(timer);
    }

    fn observe_mutations(&mut self) {
        if self.observer.is_none() {
            let dispatcher = self.dispatcher.clone();
            let callback = Closure::wrap(Box::new(move |records: js_sys::Array| {
                let mutations = mutations_from(&records);
                if !mutations.is_empty() {
                    dispatcher.send(Wakeup::Mutations(mutations));
                }
            }) as Box<dyn FnMut(js_sys::Array)>);
            match MutationObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => self.observer = Some((observer, callback)),
                Err(e) => {
                    error!(?e, "Failed to create MutationObserver");
                    return;
                }
            }
        }

        let root = self.document.document_element();
        let (Some((observer, _)), Some(root)) = (&self.observer, root) else {
            return;
        };
        let filter = js_sys::Array::of2(&"style".into(), &"class".into());
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        init.set_attribute_filter(&filter);
        if let Err(e) = observer.observe_with_options(&root, &init) {
            error!(?e, "Failed to observe mutations");
        }
    }

    fn disconnect_mutations(&mut self) {
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
    }
}

/// `chrome.storage.sync` snapshot, writes go straight through
#[derive(Debug, Default)]
struct SyncStorage {
    settings: Option<Settings>,
}

#[derive(Deserialize)]
struct StoredItems {
    enabled: Option<bool>,
}

impl SyncStorage {
    /// Read the stored flag and hand the snapshot to `then`
    fn fetch(then: impl FnOnce(SyncStorage) + 'static) {
        let callback = Closure::once_into_js(move |items: JsValue| {
            let settings = to_json(&items)
                .and_then(|json| serde_json::from_str::<StoredItems>(&json).ok())
                .and_then(|stored| stored.enabled)
                .map(|enabled| Settings { enabled });
            then(SyncStorage { settings });
        });
        storage_sync_get(&JsValue::NULL, callback.unchecked_ref());
    }
}

impl FlagStore for SyncStorage {
    fn load(&self) -> Option<Settings> {
        self.settings
    }

    fn save(&mut self, settings: Settings) {
        self.settings = Some(settings);
        let Ok(json) = serde_json::to_string(&settings) else {
            return;
        };
        match from_json(&json) {
            Ok(items) => storage_sync_set(&items),
            Err(e) => error!(?e, "Failed to encode settings"),
        }
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();
}

/// Content script: stylesheet first, then the stored flag, then live toggles
#[wasm_bindgen]
pub fn run_content_script() {
    let Some(window) = web_sys::window() else {
        error!("No window");
        return;
    };
    let Some(document) = window.document() else {
        error!("No document");
        return;
    };

    let dispatcher = Dispatcher::default();
    let host = WebHost::new(window, document, dispatcher.clone());
    let dark_mode = Rc::new(RefCell::new(DarkMode::new(host, ScanSchedule::default())));
    dispatcher.bind(&dark_mode);

    dark_mode.borrow_mut().preload();

    let dm = dark_mode.clone();
    SyncStorage::fetch(move |store| {
        let enabled = toggle::read_enabled_flag(&store);
        dm.borrow_mut().apply_flag(enabled);
    });

    // Holds the controller for the page's lifetime
    let on_message = Closure::wrap(Box::new(move |message: JsValue| {
        let Some(raw) = to_json(&message) else {
            return;
        };
        if let Err(e) = dark_mode.borrow_mut().handle_message(&raw) {
            warn!(error = %e, "Runtime message rejected");
        }
    }) as Box<dyn FnMut(JsValue)>);
    runtime_on_message(on_message.as_ref().unchecked_ref());
    on_message.forget();

    info!("Content script ready");
}

/// Background worker install hook
#[wasm_bindgen]
pub fn on_installed() {
    SyncStorage::fetch(|mut store| {
        toggle::on_installed(&mut store);
    });
}

/// Popup: pass the stored flag to `callback`
#[wasm_bindgen]
pub fn popup_read_enabled(callback: js_sys::Function) {
    SyncStorage::fetch(move |store| {
        let enabled = toggle::read_enabled_flag(&store);
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_bool(enabled)) {
            error!(?e, "Popup callback failed");
        }
    });
}

/// Popup: persist the flag and notify every open ESPN tab
#[wasm_bindgen]
pub fn popup_set_enabled(enabled: bool) -> String {
    let mut store = SyncStorage::default();
    let message = toggle::set_enabled(&mut store, enabled);

    match from_json(&message.to_json()) {
        Ok(payload) => broadcast(payload),
        Err(e) => error!(?e, "Failed to encode toggle message"),
    }
    Settings { enabled }.status_label().to_string()
}

#[wasm_bindgen]
pub fn status_label(enabled: bool) -> String {
    Settings { enabled }.status_label().to_string()
}

#[derive(Deserialize)]
struct TabInfo {
    id: Option<f64>,
}

fn broadcast(payload: JsValue) {
    let query = js_sys::Object::new();
    if let Err(e) = js_sys::Reflect::set(&query, &"url".into(), &HOST_TAB_PATTERN.into()) {
        error!(?e, "Failed to build tab query");
        return;
    }

    let callback = Closure::once_into_js(move |tabs: JsValue| {
        let tabs: Vec<TabInfo> = to_json(&tabs)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
        // Tabs without the content script reject
        let ignore = Closure::wrap(Box::new(|_: JsValue| {}) as Box<dyn FnMut(JsValue)>);
        for id in tabs.iter().filter_map(|t| t.id) {
            let _ = tabs_send_message(id, &payload).catch(&ignore);
        }
        ignore.forget();
        debug!(tabs = tabs.len(), "Toggle broadcast");
    });
    tabs_query(&query, callback.unchecked_ref());
}
