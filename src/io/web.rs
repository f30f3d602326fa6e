//! Browser host: runs the coordinator against the live DOM from a content script.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Once;

use wasm_bindgen::JsCast;
use tracing_wasm::WASMLayerConfigBuilder;
use wasm_bindgen::prelude::*;
use web_sys::{
    CssStyleDeclaration, Element, HtmlElement, MutationObserver, MutationObserverInit, Node,
    NodeList, SvgElement,
};

use crate::io::coordinator::Coordinator;
use crate::model::page::{
    MutationKind, MutationRecord, MutationSource, NodeType, ObserveOptions, Page, SubscribeError,
    SubscriptionId,
};
use crate::ops::rules::Rules;
use crate::parse::Selector;

type Queue = Rc<RefCell<Vec<(SubscriptionId, Vec<MutationRecord<Element>>)>>>;
type Wake = Rc<RefCell<Option<Box<dyn Fn()>>>>;

struct Observation {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

/// The live document seen through the host traits.
///
/// `MutationObserver` callbacks push converted records onto a queue and then
/// call the wake hook, which drains the queue through the coordinator.
pub struct WebPage {
    document: web_sys::Document,
    observations: HashMap<SubscriptionId, Observation>,
    queue: Queue,
    wake: Wake,
    next_id: u64,
}

impl WebPage {
    pub fn new(document: web_sys::Document) -> Self {
        WebPage {
            document,
            observations: HashMap::new(),
            queue: Rc::new(RefCell::new(Vec::new())),
            wake: Rc::new(RefCell::new(None)),
            next_id: 1,
        }
    }

    fn take_queued(&self) -> Vec<(SubscriptionId, Vec<MutationRecord<Element>>)> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

fn js_error(value: JsValue) -> SubscribeError {
    SubscribeError(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn inline_style(node: &Element) -> Option<CssStyleDeclaration> {
    if let Some(html) = node.dyn_ref::<HtmlElement>() {
        return Some(html.style());
    }
    node.dyn_ref::<SvgElement>().map(SvgElement::style)
}

/// Records about text nodes are reported against their parent element
fn convert_record(record: web_sys::MutationRecord) -> Option<MutationRecord<Element>> {
    let kind = match record.type_().as_str() {
        "childList" => MutationKind::ChildList,
        "attributes" => MutationKind::Attributes,
        "characterData" => MutationKind::CharacterData,
        _ => return None,
    };
    let target = record.target()?;
    let target_type = match target.node_type() {
        Node::ELEMENT_NODE => NodeType::Element,
        Node::TEXT_NODE => NodeType::Text,
        _ => NodeType::Other,
    };
    let element = match target.dyn_ref::<Element>() {
        Some(el) => el.clone(),
        None => target.parent_element()?,
    };
    Some(MutationRecord {
        kind,
        target: element,
        target_type,
    })
}

impl Page for WebPage {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        self.document
            .query_selector_all(selector.as_str())
            .map(elements)
            .unwrap_or_default()
    }

    fn query_within(&self, scope: &Element, selector: &Selector) -> Vec<Element> {
        scope
            .query_selector_all(selector.as_str())
            .map(elements)
            .unwrap_or_default()
    }

    fn visible_text(&self, node: &Element) -> String {
        match node.dyn_ref::<HtmlElement>() {
            Some(html) => html.inner_text(),
            None => node.text_content().unwrap_or_default(),
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn style_property(&self, node: &Element, property: &str) -> Option<String> {
        inline_style(node)?
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }

    fn set_style_property(&mut self, node: &Element, property: &str, value: &str) {
        let Some(style) = inline_style(node) else {
            return;
        };
        if let Err(e) = style.set_property(property, value) {
            tracing::warn!(property, error = ?e, "could not set style");
        }
    }
}

impl MutationSource for WebPage {
    fn subscribe(
        &mut self,
        target: &Element,
        options: ObserveOptions,
    ) -> Result<SubscriptionId, SubscribeError> {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let queue = Rc::clone(&self.queue);
        let wake = Rc::clone(&self.wake);
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let converted: Vec<MutationRecord<Element>> = records
                    .iter()
                    .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
                    .filter_map(convert_record)
                    .collect();
                queue.borrow_mut().push((id, converted));
                if let Some(wake) = wake.borrow().as_ref() {
                    wake();
                }
            },
        );

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(js_error)?;
        let init = MutationObserverInit::new();
        init.set_child_list(options.child_list);
        init.set_subtree(options.subtree);
        init.set_attributes(options.attributes);
        init.set_character_data(options.character_data);
        observer
            .observe_with_options(target, &init)
            .map_err(js_error)?;

        self.observations.insert(
            id,
            Observation {
                observer,
                _callback: callback,
            },
        );
        Ok(id)
    }

    fn dispose(&mut self, id: SubscriptionId) {
        if let Some(observation) = self.observations.remove(&id) {
            observation.observer.disconnect();
        }
        self.queue.borrow_mut().retain(|(sub, _)| *sub != id);
    }
}

struct Runtime {
    page: WebPage,
    coordinator: Coordinator,
}

impl Runtime {
    fn drain(&mut self) {
        loop {
            let batch = self.page.take_queued();
            if batch.is_empty() {
                return;
            }
            for (id, records) in batch {
                self.coordinator.notify(&mut self.page, id, &records);
            }
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Option<Rc<RefCell<Runtime>>>> = const { RefCell::new(None) };
}

static LOGGING: Once = Once::new();

/// Route `tracing` events to the browser console
fn init_logging() {
    LOGGING.call_once(|| {
        tracing_wasm::set_as_global_default_with_config(
            WASMLayerConfigBuilder::new()
                .set_max_level(tracing::Level::DEBUG)
                .build(),
        );
    });
}

fn start(document: web_sys::Document) -> Result<(), JsValue> {
    let rules = Rules::habitica().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let page = WebPage::new(document);
    let wake = Rc::clone(&page.wake);
    let runtime = Rc::new(RefCell::new(Runtime {
        page,
        coordinator: Coordinator::new(rules),
    }));

    let weak = Rc::downgrade(&runtime);
    *wake.borrow_mut() = Some(Box::new(move || {
        let Some(runtime) = weak.upgrade() else {
            return;
        };
        // Already draining: the running loop picks up the new records
        if let Ok(mut rt) = runtime.try_borrow_mut() {
            rt.drain();
        }
    }));

    {
        let mut rt = runtime.borrow_mut();
        let Runtime { page, coordinator } = &mut *rt;
        coordinator.start(page);
        rt.drain();
    }

    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
    tracing::info!("veil attached");
    Ok(())
}

/// Content-script entry point. Starts once the page has loaded.
#[wasm_bindgen]
pub fn attach() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    init_logging();
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() == "complete" {
        return start(document);
    }

    let on_load = Closure::once_into_js(move || {
        if let Err(e) = start(document) {
            tracing::warn!(error = ?e, "could not attach");
        }
    });
    window.add_event_listener_with_callback("load", on_load.unchecked_ref())?;
    Ok(())
}

/// Stop observing and release every observer
#[wasm_bindgen]
pub fn detach() {
    let Some(runtime) = RUNTIME.with(|slot| slot.borrow_mut().take()) else {
        return;
    };
    let mut rt = runtime.borrow_mut();
    *rt.page.wake.borrow_mut() = None;
    let Runtime { page, coordinator } = &mut *rt;
    coordinator.stop(page);
    tracing::info!("veil detached");
}
