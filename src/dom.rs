//! DOM Adapters
//!
//! web-sys implementations of the protocol's element probe, field view and
//! document surface.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

use inline_commit::region::ERRORS_REGION_NAME;
use inline_commit::{Alert, ElementProbe, FieldView, RegionBinding, RetryRequest, Surface};

use crate::components::ErrorAlert;
use crate::config::PortalConfig;

/// Marker class of the retry button inside an error alert
pub const RETRY_BUTTON_CLASS: &str = "o_portal_retry";

pub fn document() -> Option<web_sys::Document> {
    web_sys::window().and_then(|w| w.document())
}

fn query(selector: &str) -> Option<Element> {
    document().and_then(|doc| doc.query_selector(selector).ok().flatten())
}

// ========================
// Element Probe
// ========================

pub struct DomProbe {
    element: Element,
}

impl DomProbe {
    pub fn new(element: Element) -> Self {
        Self { element }
    }
}

impl ElementProbe for DomProbe {
    fn attr(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn value(&self) -> Option<String> {
        form_value(&self.element)
    }

    fn row_input(&self, selector: &str) -> Option<String> {
        let row = self.element.closest("tr").ok().flatten()?;
        let input = row.query_selector(selector).ok().flatten()?;
        form_value(&input)
    }
}

fn form_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        return Some(select.value());
    }
    element.dyn_ref::<HtmlTextAreaElement>().map(|area| area.value())
}

// ========================
// Field View
// ========================

/// A display element (label) and its editor input
pub struct DomFieldView {
    display: Option<HtmlElement>,
    editor: HtmlInputElement,
    hidden_class: String,
}

impl DomFieldView {
    pub fn new(display: Option<HtmlElement>, editor: HtmlInputElement, hidden_class: &str) -> Self {
        Self {
            display,
            editor,
            hidden_class: hidden_class.to_string(),
        }
    }
}

impl FieldView for DomFieldView {
    fn show_display(&self) {
        // Inputs without a display counterpart stay visible
        let Some(display) = &self.display else {
            return;
        };
        let _ = self.editor.class_list().add_1(&self.hidden_class);
        let _ = display.class_list().remove_1(&self.hidden_class);
    }

    fn show_editor(&self) {
        let Some(display) = &self.display else {
            return;
        };
        let _ = display.class_list().add_1(&self.hidden_class);
        let _ = self.editor.class_list().remove_1(&self.hidden_class);
        let _ = self.editor.focus();
    }

    fn restore_input(&self, value: &str) {
        self.editor.set_value(value);
    }

    fn set_busy(&self, busy: bool) {
        self.editor.set_disabled(busy);
        if let Some(display) = &self.display {
            let _ = if busy {
                display.set_attribute("aria-busy", "true")
            } else {
                display.remove_attribute("aria-busy")
            };
        }
    }
}

// ========================
// Document Surface
// ========================

/// An alert currently mounted in the errors region
struct MountedAlert {
    /// Leptos unmount handle; dropping it removes the view
    _view: Box<dyn Any>,
    _on_retry: Option<Closure<dyn FnMut(web_sys::Event)>>,
}

/// The alert mounted in the shared errors region, whichever widget
/// instance mounted it
#[derive(Default)]
pub struct AlertSlot(RefCell<Option<MountedAlert>>);

impl AlertSlot {
    /// Mount `alert`, releasing whatever alert was mounted before
    fn hold(&self, alert: MountedAlert) {
        let previous = self.0.borrow_mut().replace(alert);
        drop(previous);
    }

    fn release(&self) {
        let previous = self.0.borrow_mut().take();
        drop(previous);
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.0.borrow().is_none()
    }
}

pub type RetryHandler = Rc<dyn Fn(RetryRequest)>;

pub struct DomSurface {
    config: Rc<PortalConfig>,
    retry_handler: RefCell<Option<RetryHandler>>,
    alert: Rc<AlertSlot>,
}

impl DomSurface {
    pub fn new(config: Rc<PortalConfig>, alert: Rc<AlertSlot>) -> Self {
        Self {
            config,
            retry_handler: RefCell::new(None),
            alert,
        }
    }

    pub fn set_retry_handler(&self, handler: RetryHandler) {
        *self.retry_handler.borrow_mut() = Some(handler);
    }

    fn region_element(&self, region: &RegionBinding) -> Option<Element> {
        let element = query(region.selector());
        if element.is_none() {
            log::warn!("region `{}` ({}) is not in the document", region.name(), region.selector());
        }
        element
    }

    fn unmount_alert(&self) {
        self.alert.release();
    }

    fn bind_retry(&self, host: &Element, request: RetryRequest) -> Option<Closure<dyn FnMut(web_sys::Event)>> {
        let handler = self.retry_handler.borrow().clone()?;
        let button = host.query_selector(&format!(".{}", RETRY_BUTTON_CLASS)).ok().flatten()?;
        let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(move |ev: web_sys::Event| {
            ev.prevent_default();
            handler(request.clone());
        });
        button
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .ok()?;
        Some(on_click)
    }
}

impl Surface for DomSurface {
    fn replace_region(&self, region: &RegionBinding, markup: &str) {
        if let Some(element) = self.region_element(region) {
            element.set_inner_html(markup);
        }
    }

    fn clear_region(&self, region: &RegionBinding) {
        if region.name() == ERRORS_REGION_NAME {
            self.unmount_alert();
        }
        if let Some(element) = self.region_element(region) {
            element.set_inner_html("");
        }
    }

    fn show_alert(&self, region: &RegionBinding, alert: Alert) {
        self.unmount_alert();
        let Some(element) = self.region_element(region) else {
            return;
        };
        element.set_inner_html("");
        let Ok(host) = element.dyn_into::<HtmlElement>() else {
            log::warn!("errors region {} is not an HTML element", region.selector());
            return;
        };

        let Alert { message, retry } = alert;
        let retry_label = retry.as_ref().map(|_| self.config.retry_label.clone());
        let handle = leptos::mount::mount_to(host.clone(), move || {
            view! { <ErrorAlert message=message retry_label=retry_label /> }
        });
        let on_retry = retry.and_then(|request| self.bind_retry(&host, request));

        self.alert.hold(MountedAlert {
            _view: Box::new(handle),
            _on_retry: on_retry,
        });
    }

    fn reload_page(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().reload() {
                log::error!("page reload failed: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountedView(Rc<Cell<u32>>);

    impl Drop for CountedView {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn mounted(dropped: &Rc<Cell<u32>>) -> MountedAlert {
        MountedAlert {
            _view: Box::new(CountedView(dropped.clone())),
            _on_retry: None,
        }
    }

    #[test]
    fn test_alert_from_other_instance_released_on_show() {
        let slot = Rc::new(AlertSlot::default());
        let first_instance = slot.clone();
        let second_instance = slot.clone();
        let dropped = Rc::new(Cell::new(0));

        first_instance.hold(mounted(&dropped));
        assert_eq!(dropped.get(), 0);

        second_instance.hold(mounted(&dropped));
        assert_eq!(dropped.get(), 1);

        first_instance.release();
        assert_eq!(dropped.get(), 2);
        assert!(second_instance.is_empty());
    }
}
