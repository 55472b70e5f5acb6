//! Widget Registry
//!
//! Mounts every widget family on the containers present in the document
//! and keeps the set in step with DOM changes.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit, MutationRecord};

use inline_commit::{WidgetFamily, FAMILIES};

use crate::commands::JsonRpcGateway;
use crate::config::PortalConfig;
use crate::dom::{document, AlertSlot};
use crate::widget::WidgetInstance;

pub struct Registry {
    config: Rc<PortalConfig>,
    gateway: Rc<JsonRpcGateway>,
    /// Every instance shares the one errors region
    alert: Rc<AlertSlot>,
    instances: RefCell<Vec<WidgetInstance>>,
    observer: RefCell<Option<(MutationObserver, Closure<dyn FnMut(js_sys::Array, MutationObserver)>)>>,
}

impl Registry {
    pub fn new(config: Rc<PortalConfig>) -> Rc<Self> {
        let gateway = Rc::new(JsonRpcGateway::new(config.clone()));
        Rc::new(Self {
            config,
            gateway,
            alert: Rc::new(AlertSlot::default()),
            instances: RefCell::new(Vec::new()),
            observer: RefCell::new(None),
        })
    }

    /// Activate once the document has been parsed
    pub fn start(self: Rc<Self>) {
        let Some(doc) = document() else {
            log::error!("no document, widgets not mounted");
            return;
        };
        if doc.ready_state() != "loading" {
            self.activate();
            return;
        }

        let on_ready = Closure::once_into_js(move || self.activate());
        if let Err(e) = doc.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
            log::error!("cannot wait for DOMContentLoaded: {:?}", e);
        }
    }

    fn activate(self: Rc<Self>) {
        self.sweep();
        self.observe();
        log::info!("{} portal widget(s) mounted", self.mounted());
    }

    pub fn mounted(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Drop instances whose container left the document, then mount every
    /// container not yet mounted
    pub fn sweep(&self) {
        let Some(doc) = document() else {
            return;
        };
        let mut instances = self.instances.borrow_mut();
        instances.retain(WidgetInstance::is_attached);

        for family in FAMILIES {
            let Ok(containers) = doc.query_selector_all(family.container) else {
                log::warn!("bad container selector {}", family.container);
                continue;
            };
            for index in 0..containers.length() {
                let Some(container) = containers.item(index).and_then(|n| n.dyn_into::<web_sys::Element>().ok())
                else {
                    continue;
                };
                if is_mounted(&instances, family, &container) {
                    continue;
                }
                instances.push(WidgetInstance::mount(
                    family,
                    container,
                    self.config.clone(),
                    self.gateway.clone(),
                    self.alert.clone(),
                ));
            }
        }
    }

    /// Re-sweep whenever nodes are added or removed anywhere in the body
    fn observe(self: &Rc<Self>) {
        let Some(body) = document().and_then(|doc| doc.body()) else {
            return;
        };

        let registry = self.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let structural = records.iter().any(|record| {
                    record
                        .dyn_into::<MutationRecord>()
                        .map(|r| r.added_nodes().length() > 0 || r.removed_nodes().length() > 0)
                        .unwrap_or(false)
                });
                if structural {
                    registry.sweep();
                }
            },
        );

        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                log::warn!("mutation observer unavailable: {:?}", e);
                return;
            }
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(e) = observer.observe_with_options(&body, &init) {
            log::warn!("cannot observe document body: {:?}", e);
            return;
        }
        *self.observer.borrow_mut() = Some((observer, callback));
    }
}

fn is_mounted(instances: &[WidgetInstance], family: &WidgetFamily, container: &web_sys::Element) -> bool {
    instances.iter().any(|instance| {
        instance.family().name == family.name && instance.container() == container
    })
}
