//! Widget Families
//!
//! Static event tables for the portal widgets and the parameter
//! extraction each binding performs on its triggering element.

use crate::error::ParamError;
use crate::gateway::RemoteCommand;
use crate::reconcile::Settlement;

/// Default selector of the shared errors region
pub const ERRORS_REGION: &str = "#edit_errors";

/// DOM event a binding listens for. All of them bubble, so one delegated
/// listener per container is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Click,
    FocusOut,
    Change,
    KeyUp,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Click => "click",
            Trigger::FocusOut => "focusout",
            Trigger::Change => "change",
            Trigger::KeyUp => "keyup",
        }
    }

    /// Gestures whose browser default action is suppressed
    pub fn prevents_default(self) -> bool {
        matches!(self, Trigger::Click | Trigger::FocusOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Text,
}

/// Where a parameter value is read from, relative to the triggering element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Attr(&'static str),
    /// The element's current form value
    Value,
    /// Value of the input matching the selector in the enclosing table row
    RowInput(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub key: &'static str,
    pub source: ParamSource,
    pub kind: ValueKind,
    /// Absent optional parameters are left out of the call
    pub required: bool,
}

const fn attr(key: &'static str, attr: &'static str) -> ParamSpec {
    ParamSpec { key, source: ParamSource::Attr(attr), kind: ValueKind::Text, required: false }
}

const fn int_attr(key: &'static str, attr: &'static str) -> ParamSpec {
    ParamSpec { key, source: ParamSource::Attr(attr), kind: ValueKind::Int, required: true }
}

const fn value(key: &'static str) -> ParamSpec {
    ParamSpec { key, source: ParamSource::Value, kind: ValueKind::Text, required: false }
}

/// Read access to the triggering element
pub trait ElementProbe {
    fn attr(&self, name: &str) -> Option<String>;
    fn value(&self) -> Option<String>;
    fn row_input(&self, selector: &str) -> Option<String>;
}

impl ParamSpec {
    fn read(&self, probe: &dyn ElementProbe) -> Result<Option<String>, ParamError> {
        let raw = match self.source {
            ParamSource::Attr(name) => probe.attr(name),
            ParamSource::Value => probe.value(),
            ParamSource::RowInput(selector) => probe.row_input(selector),
        };
        match (raw, self.required, self.source) {
            (Some(raw), _, _) => Ok(Some(raw)),
            (None, false, _) => Ok(None),
            (None, true, ParamSource::Attr(attr)) => {
                Err(ParamError::MissingAttribute { key: self.key, attr })
            }
            (None, true, _) => Err(ParamError::MissingValue { key: self.key }),
        }
    }

    pub fn apply(&self, command: &mut RemoteCommand, probe: &dyn ElementProbe) -> Result<(), ParamError> {
        let Some(raw) = self.read(probe)? else {
            return Ok(());
        };
        match self.kind {
            ValueKind::Text => command.insert(self.key, raw),
            ValueKind::Int => {
                let parsed = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ParamError::NotAnInteger { key: self.key, raw: raw.clone() })?;
                command.insert(self.key, parsed);
            }
        }
        Ok(())
    }
}

/// A remote operation triggered by a click or a list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub route: &'static str,
    pub params: &'static [ParamSpec],
    pub settlement: Settlement,
}

impl OperationSpec {
    pub fn build(&self, probe: &dyn ElementProbe) -> Result<RemoteCommand, ParamError> {
        let mut command = RemoteCommand::new(self.route);
        for spec in self.params {
            spec.apply(&mut command, probe)?;
        }
        Ok(command)
    }
}

/// Where the last known server value of a field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginalValue {
    /// Text of the display element
    DisplayText,
    /// The editor's server-rendered `value` attribute
    DefaultValue,
}

/// An inline field edit committed on focus loss or change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldCommitSpec {
    pub route: &'static str,
    /// Display element shown outside edit mode; None when the input is
    /// always visible
    pub display: Option<&'static str>,
    pub owner: ParamSpec,
    /// Parameter carrying the editor's `name` attribute
    pub attribute_key: Option<&'static str>,
    pub value_key: &'static str,
    pub original: OriginalValue,
    pub settlement: Settlement,
}

impl FieldCommitSpec {
    /// Build the commit for `new_value`; `field_name` is the editor's name
    pub fn build(
        &self,
        probe: &dyn ElementProbe,
        field_name: &str,
        new_value: &str,
    ) -> Result<RemoteCommand, ParamError> {
        let mut command = RemoteCommand::new(self.route);
        self.owner.apply(&mut command, probe)?;
        if let Some(key) = self.attribute_key {
            command.insert(key, field_name);
        }
        command.insert(self.value_key, new_value);
        Ok(command)
    }

    pub fn owner_id(&self, probe: &dyn ElementProbe) -> Result<String, ParamError> {
        self.owner
            .read(probe)?
            .ok_or(ParamError::MissingValue { key: self.owner.key })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Swap the clicked display element for the editor matching the selector
    StartEdit { editor: &'static str },
    CommitField(FieldCommitSpec),
    Action(OperationSpec),
    /// Always-fire list query, no significance gate
    Query(OperationSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBinding {
    pub trigger: Trigger,
    pub selector: &'static str,
    pub behavior: Behavior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpec {
    pub name: &'static str,
    pub selector: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetFamily {
    pub name: &'static str,
    pub container: &'static str,
    pub regions: &'static [RegionSpec],
    pub events: &'static [EventBinding],
}

impl WidgetFamily {
    pub fn triggers(&self) -> Vec<Trigger> {
        let mut triggers: Vec<Trigger> = Vec::new();
        for binding in self.events {
            if !triggers.contains(&binding.trigger) {
                triggers.push(binding.trigger);
            }
        }
        triggers
    }

    pub fn bindings_for(&self, trigger: Trigger) -> impl Iterator<Item = &'static EventBinding> {
        let events: &'static [EventBinding] = self.events;
        events.iter().filter(move |binding| binding.trigger == trigger)
    }
}

// ========================
// Portal Families
// ========================

const PRODUCT_LIST: &str = "product_list";
const DETAILS: &str = "details";
const DATA: &str = "data";

const PRODUCT_TABLE_ROUTE: &str = "/purchase_request_product_table";

pub const PURCHASE_REQUEST: WidgetFamily = WidgetFamily {
    name: "purchase_request",
    container: "#purchase_request_container",
    regions: &[
        RegionSpec { name: PRODUCT_LIST, selector: "#purchase_request_product_list" },
        RegionSpec { name: DETAILS, selector: "#purchase_request_details_list" },
    ],
    events: &[
        EventBinding {
            trigger: Trigger::KeyUp,
            selector: "input.oe_search_box",
            behavior: Behavior::Query(OperationSpec {
                route: PRODUCT_TABLE_ROUTE,
                params: &[
                    value("search"),
                    attr("property_id", "data-property_id"),
                    attr("purchase_request", "data-purchase_request"),
                ],
                settlement: Settlement::Replace(PRODUCT_LIST),
            }),
        },
        EventBinding {
            trigger: Trigger::Change,
            selector: "select.purchase_select",
            behavior: Behavior::Query(OperationSpec {
                route: PRODUCT_TABLE_ROUTE,
                params: &[
                    value("category_id"),
                    attr("property_id", "data-property_id"),
                    attr("purchase_request", "data-purchase_request"),
                ],
                settlement: Settlement::Replace(PRODUCT_LIST),
            }),
        },
        EventBinding {
            trigger: Trigger::Change,
            selector: "select.purchase_seller",
            behavior: Behavior::Query(OperationSpec {
                route: PRODUCT_TABLE_ROUTE,
                params: &[
                    value("seller_id"),
                    attr("property_id", "data-property_id"),
                    attr("purchase_request", "data-purchase_request"),
                ],
                settlement: Settlement::Replace(PRODUCT_LIST),
            }),
        },
        EventBinding {
            trigger: Trigger::Click,
            selector: "button.request_add_to_cart",
            behavior: Behavior::Action(OperationSpec {
                route: "/purchase_request_add_product",
                params: &[
                    attr("purchase_request", "data-purchase_request"),
                    attr("product_id", "data-product_id"),
                    ParamSpec {
                        key: "qty",
                        source: ParamSource::RowInput("input[name='product_qty']"),
                        kind: ValueKind::Text,
                        required: false,
                    },
                ],
                settlement: Settlement::Replace(DETAILS),
            }),
        },
        EventBinding {
            trigger: Trigger::Change,
            selector: "input.purchase_update_line",
            behavior: Behavior::CommitField(FieldCommitSpec {
                route: "/purchase_request_update_line",
                display: None,
                owner: ParamSpec {
                    key: "line_id",
                    source: ParamSource::Attr("data-line_id"),
                    kind: ValueKind::Text,
                    required: true,
                },
                attribute_key: None,
                value_key: "qty",
                original: OriginalValue::DefaultValue,
                settlement: Settlement::Replace(DETAILS),
            }),
        },
        EventBinding {
            trigger: Trigger::Click,
            selector: "a.purchase_delete_line",
            behavior: Behavior::Action(OperationSpec {
                route: "/purchase_delete_line",
                params: &[attr("line_id", "data-line_id")],
                settlement: Settlement::Replace(DETAILS),
            }),
        },
        EventBinding {
            trigger: Trigger::Click,
            selector: "button.request_validation",
            behavior: Behavior::Action(OperationSpec {
                route: "/purchase_request_validation",
                params: &[attr("purchase_request", "data-purchase_request")],
                settlement: Settlement::Reload,
            }),
        },
        EventBinding {
            trigger: Trigger::Click,
            selector: "button.restart_validation",
            behavior: Behavior::Action(OperationSpec {
                route: "/purchase_request_restart_validation",
                params: &[attr("purchase_request", "data-purchase_request")],
                settlement: Settlement::Reload,
            }),
        },
    ],
};

pub const SAVED_CART: WidgetFamily = WidgetFamily {
    name: "saved_cart",
    container: ".o_saved_cart_data_container",
    regions: &[RegionSpec { name: DATA, selector: "#o_saved_cart_data_container" }],
    events: &[
        EventBinding {
            trigger: Trigger::Click,
            selector: "span.o_saved_cart_change_name",
            behavior: Behavior::StartEdit { editor: ".o_hidden_saved_cart_name_input" },
        },
        EventBinding {
            trigger: Trigger::FocusOut,
            selector: ".o_hidden_saved_cart_name_input",
            behavior: Behavior::CommitField(FieldCommitSpec {
                route: "/saved_cart_edit",
                display: Some(".o_saved_cart_change_name"),
                owner: int_attr("saved_cart", "data-saved_cart"),
                attribute_key: Some("attr_name"),
                value_key: "value",
                original: OriginalValue::DisplayText,
                settlement: Settlement::Replace(DATA),
            }),
        },
    ],
};

pub const SAVED_CART_ITEMS: WidgetFamily = WidgetFamily {
    name: "saved_cart_items",
    container: ".o_saved_cart_summary",
    regions: &[RegionSpec { name: DATA, selector: "#o_saved_cart_summary_container" }],
    events: &[
        EventBinding {
            trigger: Trigger::Click,
            selector: "span.o_cart_line_change_qty",
            behavior: Behavior::StartEdit { editor: ".o_hidden_cart_line_quantity_input" },
        },
        EventBinding {
            trigger: Trigger::FocusOut,
            selector: ".o_hidden_cart_line_quantity_input",
            behavior: Behavior::CommitField(FieldCommitSpec {
                route: "/saved_cart_item_edit",
                display: Some(".o_cart_line_change_qty"),
                owner: int_attr("item_id", "data-item_id"),
                attribute_key: Some("attr_name"),
                value_key: "value",
                original: OriginalValue::DisplayText,
                settlement: Settlement::Replace(DATA),
            }),
        },
    ],
};

pub const STOCK_PICKING_LINES: WidgetFamily = WidgetFamily {
    name: "stock_picking_lines",
    container: "#stock_picking_container",
    regions: &[RegionSpec { name: DATA, selector: "#stock_picking_container" }],
    events: &[
        EventBinding {
            trigger: Trigger::Click,
            selector: "span.set_quantity_done",
            behavior: Behavior::StartEdit { editor: ".o_hidden_quantity_done_input" },
        },
        EventBinding {
            trigger: Trigger::FocusOut,
            selector: ".o_hidden_quantity_done_input",
            behavior: Behavior::CommitField(FieldCommitSpec {
                route: "/stock_picking_line_edit",
                display: Some(".set_quantity_done"),
                owner: int_attr("line_id", "data-line_id"),
                attribute_key: Some("attr_name"),
                value_key: "value",
                original: OriginalValue::DisplayText,
                settlement: Settlement::Replace(DATA),
            }),
        },
    ],
};

pub const STOCK_PICKING_CONTROLS: WidgetFamily = WidgetFamily {
    name: "stock_picking_controls",
    container: "#stock_picking_controls",
    regions: &[],
    events: &[EventBinding {
        trigger: Trigger::Click,
        selector: "button.picking_validate",
        behavior: Behavior::Action(OperationSpec {
            route: "/stock_picking_validate",
            params: &[int_attr("picking_id", "data-stock_picking")],
            settlement: Settlement::Reload,
        }),
    }],
};

pub const FAMILIES: &[WidgetFamily] = &[
    PURCHASE_REQUEST,
    SAVED_CART,
    SAVED_CART_ITEMS,
    STOCK_PICKING_LINES,
    STOCK_PICKING_CONTROLS,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Primitive;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeElement {
        attrs: HashMap<&'static str, &'static str>,
        value: Option<&'static str>,
        row: HashMap<&'static str, &'static str>,
    }

    impl ElementProbe for FakeElement {
        fn attr(&self, name: &str) -> Option<String> {
            self.attrs.get(name).map(|v| v.to_string())
        }
        fn value(&self) -> Option<String> {
            self.value.map(str::to_string)
        }
        fn row_input(&self, selector: &str) -> Option<String> {
            self.row.get(selector).map(|v| v.to_string())
        }
    }

    fn binding(family: &WidgetFamily, selector: &str) -> Behavior {
        family
            .events
            .iter()
            .find(|b| b.selector == selector)
            .map(|b| b.behavior)
            .expect("binding should exist")
    }

    #[test]
    fn test_every_replace_targets_a_bound_region() {
        for family in FAMILIES {
            for event in family.events {
                let settlement = match event.behavior {
                    Behavior::CommitField(spec) => spec.settlement,
                    Behavior::Action(op) | Behavior::Query(op) => op.settlement,
                    Behavior::StartEdit { .. } => continue,
                };
                if let Settlement::Replace(name) = settlement {
                    assert!(
                        family.regions.iter().any(|r| r.name == name),
                        "{} targets unbound region {}",
                        family.name,
                        name
                    );
                }
            }
        }
    }

    #[test]
    fn test_workflow_operations_reload() {
        for (family, selector) in [
            (&PURCHASE_REQUEST, "button.request_validation"),
            (&PURCHASE_REQUEST, "button.restart_validation"),
            (&STOCK_PICKING_CONTROLS, "button.picking_validate"),
        ] {
            match binding(family, selector) {
                Behavior::Action(op) => assert_eq!(op.settlement, Settlement::Reload),
                other => panic!("unexpected behavior {:?}", other),
            }
        }
    }

    #[test]
    fn test_add_to_cart_reads_row_quantity() {
        let Behavior::Action(op) = binding(&PURCHASE_REQUEST, "button.request_add_to_cart") else {
            panic!("add to cart should be an action");
        };
        let element = FakeElement {
            attrs: HashMap::from([("data-product_id", "42"), ("data-purchase_request", "7")]),
            row: HashMap::from([("input[name='product_qty']", "1")]),
            ..Default::default()
        };

        let command = op.build(&element).unwrap();
        assert_eq!(command.route, "/purchase_request_add_product");
        assert_eq!(command.params.get("product_id"), Some(&Primitive::Text("42".into())));
        assert_eq!(command.params.get("purchase_request"), Some(&Primitive::Text("7".into())));
        assert_eq!(command.params.get("qty"), Some(&Primitive::Text("1".into())));
    }

    #[test]
    fn test_optional_params_are_omitted() {
        let Behavior::Query(op) = binding(&PURCHASE_REQUEST, "input.oe_search_box") else {
            panic!("search should be a query");
        };
        let element = FakeElement {
            attrs: HashMap::from([("data-property_id", "3")]),
            value: Some("soap"),
            ..Default::default()
        };

        let command = op.build(&element).unwrap();
        assert_eq!(command.params.len(), 2);
        assert_eq!(command.params.get("search"), Some(&Primitive::Text("soap".into())));
        assert!(command.params.get("purchase_request").is_none());
    }

    #[test]
    fn test_picking_validate_requires_attribute() {
        let Behavior::Action(op) = binding(&STOCK_PICKING_CONTROLS, "button.picking_validate") else {
            panic!("validate should be an action");
        };
        let err = op.build(&FakeElement::default()).unwrap_err();
        assert_eq!(
            err,
            ParamError::MissingAttribute { key: "picking_id", attr: "data-stock_picking" }
        );

        let element = FakeElement {
            attrs: HashMap::from([("data-stock_picking", "15")]),
            ..Default::default()
        };
        let command = op.build(&element).unwrap();
        assert_eq!(command.params.get("picking_id"), Some(&Primitive::Int(15)));
    }

    #[test]
    fn test_field_commit_params() {
        let Behavior::CommitField(spec) = binding(&SAVED_CART_ITEMS, ".o_hidden_cart_line_quantity_input")
        else {
            panic!("quantity input should commit");
        };
        let element = FakeElement {
            attrs: HashMap::from([("data-item_id", "31")]),
            ..Default::default()
        };

        assert_eq!(spec.owner_id(&element).unwrap(), "31");
        let command = spec.build(&element, "quantity", "4").unwrap();
        assert_eq!(command.route, "/saved_cart_item_edit");
        assert_eq!(command.params.get("item_id"), Some(&Primitive::Int(31)));
        assert_eq!(command.params.get("attr_name"), Some(&Primitive::Text("quantity".into())));
        assert_eq!(command.params.get("value"), Some(&Primitive::Text("4".into())));
    }

    #[test]
    fn test_integer_owner_rejects_garbage() {
        let Behavior::CommitField(spec) = binding(&STOCK_PICKING_LINES, ".o_hidden_quantity_done_input")
        else {
            panic!("quantity done input should commit");
        };
        let element = FakeElement {
            attrs: HashMap::from([("data-line_id", "abc")]),
            ..Default::default()
        };
        assert!(matches!(
            spec.build(&element, "quantity_done", "3"),
            Err(ParamError::NotAnInteger { key: "line_id", .. })
        ));
    }

    #[test]
    fn test_triggers_are_deduplicated() {
        assert_eq!(
            PURCHASE_REQUEST.triggers(),
            vec![Trigger::KeyUp, Trigger::Change, Trigger::Click]
        );
        assert_eq!(SAVED_CART.triggers(), vec![Trigger::Click, Trigger::FocusOut]);
    }
}
