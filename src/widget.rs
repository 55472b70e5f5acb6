//! Widget Instances
//!
//! One mounted portal widget: a container element, delegated listeners for
//! its family's triggers, and the fields currently tracked inside it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use leptos::task::spawn_local;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, HtmlElement, HtmlInputElement};

use inline_commit::{
    Behavior, CommitCoordinator, CommitReport, EditableField, EventBinding, FieldCommitSpec,
    FieldKey, FieldView, OperationSpec, OriginalValue, Reconciled, RegionSet, RetryRequest, Trigger,
    WidgetFamily,
};

use crate::commands::JsonRpcGateway;
use crate::config::PortalConfig;
use crate::dom::{AlertSlot, DomFieldView, DomProbe, DomSurface};

type Listener = Closure<dyn FnMut(Event)>;

struct WidgetState {
    family: &'static WidgetFamily,
    container: Element,
    config: Rc<PortalConfig>,
    coordinator: CommitCoordinator<Rc<JsonRpcGateway>>,
    fields: RefCell<HashMap<FieldKey, Rc<RefCell<EditableField>>>>,
    /// Last rendered pair of each tracked field
    views: RefCell<HashMap<FieldKey, Rc<DomFieldView>>>,
}

/// A mounted widget. Dropping it detaches its listeners.
pub struct WidgetInstance {
    state: Rc<WidgetState>,
    listeners: Vec<(Trigger, Listener)>,
}

impl WidgetInstance {
    pub fn mount(
        family: &'static WidgetFamily,
        container: Element,
        config: Rc<PortalConfig>,
        gateway: Rc<JsonRpcGateway>,
        alert: Rc<AlertSlot>,
    ) -> Self {
        let regions = family
            .regions
            .iter()
            .fold(RegionSet::new(config.errors_region.clone()), |set, region| {
                set.with_region(region.name, region.selector)
            });
        let surface = Rc::new(DomSurface::new(config.clone(), alert));
        let coordinator = CommitCoordinator::new(gateway, regions, surface.clone());

        let state = Rc::new(WidgetState {
            family,
            container,
            config,
            coordinator,
            fields: RefCell::new(HashMap::new()),
            views: RefCell::new(HashMap::new()),
        });

        let weak = Rc::downgrade(&state);
        surface.set_retry_handler(Rc::new(move |request: RetryRequest| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            spawn_local(async move {
                let tracked = request.commit.owner.as_ref().and_then(|key| state.tracked(key));
                let report = match tracked {
                    Some((field, view)) => state.coordinator.retry_field(&field, &*view, request).await,
                    None => state.coordinator.retry(request).await,
                };
                state.after_settle(report);
            });
        }));

        let listeners = family
            .triggers()
            .into_iter()
            .filter_map(|trigger| {
                let weak = Rc::downgrade(&state);
                let listener = Listener::new(move |ev: Event| {
                    if let Some(state) = weak.upgrade() {
                        state.handle(trigger, ev);
                    }
                });
                match state
                    .container
                    .add_event_listener_with_callback(trigger.as_str(), listener.as_ref().unchecked_ref())
                {
                    Ok(()) => Some((trigger, listener)),
                    Err(e) => {
                        log::error!("{}: cannot listen for {}: {:?}", family.name, trigger.as_str(), e);
                        None
                    }
                }
            })
            .collect();

        log::debug!("mounted {} on {}", family.name, family.container);
        Self { state, listeners }
    }

    pub fn family(&self) -> &'static WidgetFamily {
        self.state.family
    }

    pub fn container(&self) -> &Element {
        &self.state.container
    }

    /// False once the container has been removed from the document
    pub fn is_attached(&self) -> bool {
        self.state.container.is_connected()
    }
}

impl Drop for WidgetInstance {
    fn drop(&mut self) {
        for (trigger, listener) in &self.listeners {
            let _ = self
                .state
                .container
                .remove_event_listener_with_callback(trigger.as_str(), listener.as_ref().unchecked_ref());
        }
        log::debug!("unmounted {}", self.state.family.name);
    }
}

impl WidgetState {
    fn handle(self: &Rc<Self>, trigger: Trigger, ev: Event) {
        let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        let Some((binding, matched)) = self.match_binding(trigger, &target) else {
            return;
        };
        if trigger.prevents_default() {
            ev.prevent_default();
        }
        self.run(binding, matched);
    }

    /// First binding whose selector matches the target or one of its
    /// ancestors inside this container
    fn match_binding(&self, trigger: Trigger, target: &Element) -> Option<(&'static EventBinding, Element)> {
        self.family.bindings_for(trigger).find_map(|binding| {
            let matched = target.closest(binding.selector).ok().flatten()?;
            self.container.contains(Some(&matched)).then_some((binding, matched))
        })
    }

    fn run(self: &Rc<Self>, binding: &'static EventBinding, matched: Element) {
        match binding.behavior {
            Behavior::StartEdit { editor } => self.start_edit(&matched, editor),
            Behavior::CommitField(spec) => self.commit_field(spec, binding.selector, matched),
            Behavior::Action(operation) | Behavior::Query(operation) => {
                self.send(operation, matched, matches!(binding.behavior, Behavior::Query(_)))
            }
        }
    }

    // ========================
    // Field Edits
    // ========================

    fn commit_spec_for(&self, editor_selector: &str) -> Option<FieldCommitSpec> {
        self.family.events.iter().find_map(|binding| match binding.behavior {
            Behavior::CommitField(spec) if binding.selector == editor_selector => Some(spec),
            _ => None,
        })
    }

    /// Display element and editor input of the pair `element` belongs to
    fn field_pair(
        &self,
        element: &Element,
        display: Option<&str>,
        editor: &str,
    ) -> Option<(Option<HtmlElement>, HtmlInputElement)> {
        let scope = element.parent_element()?;
        let editor = if element.matches(editor).unwrap_or(false) {
            element.clone()
        } else {
            scope.query_selector(editor).ok().flatten()?
        };
        let display = display.and_then(|selector| {
            if element.matches(selector).unwrap_or(false) {
                return Some(element.clone());
            }
            scope.query_selector(selector).ok().flatten()
        });
        Some((
            display.and_then(|d| d.dyn_into::<HtmlElement>().ok()),
            editor.dyn_into::<HtmlInputElement>().ok()?,
        ))
    }

    fn server_value(spec: &FieldCommitSpec, display: Option<&HtmlElement>, editor: &HtmlInputElement) -> String {
        match spec.original {
            OriginalValue::DisplayText => display
                .and_then(|d| d.text_content())
                .map(|text| text.trim().to_string())
                .unwrap_or_default(),
            OriginalValue::DefaultValue => editor.default_value(),
        }
    }

    /// Tracked field for `key`, created or refreshed from the document
    fn track(&self, key: FieldKey, server_value: String) -> Rc<RefCell<EditableField>> {
        let mut fields = self.fields.borrow_mut();
        let field = fields
            .entry(key.clone())
            .or_insert_with(|| Rc::new(RefCell::new(EditableField::new(key, server_value.clone()))));
        field.borrow_mut().refresh_original(server_value);
        field.clone()
    }

    fn tracked(&self, key: &FieldKey) -> Option<(Rc<RefCell<EditableField>>, Rc<DomFieldView>)> {
        let field = self.fields.borrow().get(key).cloned()?;
        let view = self.views.borrow().get(key).cloned()?;
        Some((field, view))
    }

    fn field_key(spec: &FieldCommitSpec, editor: &HtmlInputElement) -> Option<FieldKey> {
        let probe = DomProbe::new(editor.clone().into());
        match spec.owner_id(&probe) {
            Ok(owner) => Some(FieldKey::new(owner, editor.name())),
            Err(e) => {
                log::warn!("{} ignored: {}", spec.route, e);
                None
            }
        }
    }

    fn start_edit(&self, display: &Element, editor_selector: &'static str) {
        let Some(spec) = self.commit_spec_for(editor_selector) else {
            log::warn!("{}: no commit bound to {}", self.family.name, editor_selector);
            return;
        };
        let Some((display, editor)) = self.field_pair(display, spec.display, editor_selector) else {
            log::warn!("{}: editor {} not found", self.family.name, editor_selector);
            return;
        };
        let Some(key) = Self::field_key(&spec, &editor) else {
            return;
        };

        let server_value = Self::server_value(&spec, display.as_ref(), &editor);
        let field = self.track(key, server_value);
        let view = DomFieldView::new(display, editor, &self.config.hidden_class);
        field.borrow_mut().begin_edit(&view);
    }

    fn commit_field(self: &Rc<Self>, spec: FieldCommitSpec, editor_selector: &str, editor: Element) {
        let Some((display, input)) = self.field_pair(&editor, spec.display, editor_selector) else {
            return;
        };
        let Some(key) = Self::field_key(&spec, &input) else {
            return;
        };

        let field_name = key.field_name.clone();
        let new_value = input.value();
        let server_value = Self::server_value(&spec, display.as_ref(), &input);
        let field = self.track(key.clone(), server_value);
        let view = Rc::new(DomFieldView::new(display, input, &self.config.hidden_class));
        self.views.borrow_mut().insert(key, view.clone());
        field.borrow_mut().end_edit(&*view);

        let command = match spec.build(&DomProbe::new(editor), &field_name, &new_value) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("{} ignored: {}", spec.route, e);
                view.restore_input(field.borrow().original_value());
                return;
            }
        };

        let state = self.clone();
        spawn_local(async move {
            let report = state
                .coordinator
                .commit_field(&field, &*view, &new_value, command, spec.settlement)
                .await;
            state.after_settle(report);
        });
    }

    // ========================
    // Actions and Queries
    // ========================

    fn send(self: &Rc<Self>, operation: OperationSpec, element: Element, is_query: bool) {
        let command = match operation.build(&DomProbe::new(element)) {
            Ok(command) => command,
            Err(e) => {
                log::warn!("{} ignored: {}", operation.route, e);
                return;
            }
        };

        let state = self.clone();
        spawn_local(async move {
            let report = match (is_query, operation.settlement.data_region()) {
                (true, Some(region)) => state.coordinator.query(command, region).await,
                _ => state.coordinator.submit(command, operation.settlement).await,
            };
            state.after_settle(report);
        });
    }

    /// Forget settled fields once their region has been re-rendered
    fn after_settle(&self, report: CommitReport) {
        if report == CommitReport::Settled(Reconciled::Replaced) {
            let mut fields = self.fields.borrow_mut();
            fields.retain(|_, field| field.borrow().is_in_flight());
            self.views.borrow_mut().retain(|key, _| fields.contains_key(key));
        }
    }
}
