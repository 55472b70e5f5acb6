//! Editable Field
//!
//! Per-field presentation state machine and the significance gate.

/// Which half of a field is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationMode {
    #[default]
    Display,
    Editing,
}

/// Identifies one remote-owned attribute: the owning record and the
/// attribute key sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub owner_id: String,
    pub field_name: String,
}

impl FieldKey {
    pub fn new(owner_id: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            field_name: field_name.into(),
        }
    }
}

/// Rendered counterpart of an [`EditableField`].
///
/// `show_display` and `show_editor` must each hide the other half in the
/// same call so no frame ever shows both or neither.
pub trait FieldView {
    fn show_display(&self);
    fn show_editor(&self);
    /// Put `value` back into the editor input
    fn restore_input(&self, value: &str);
    /// Mark the field as waiting on the server
    fn set_busy(&self, busy: bool);
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditableField {
    key: FieldKey,
    original_value: String,
    mode: PresentationMode,
    in_flight: bool,
}

impl EditableField {
    pub fn new(key: FieldKey, original_value: impl Into<String>) -> Self {
        Self {
            key,
            original_value: original_value.into(),
            mode: PresentationMode::Display,
            in_flight: false,
        }
    }

    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    pub fn original_value(&self) -> &str {
        &self.original_value
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    /// Re-read the last known server value, unless a commit is pending
    pub fn refresh_original(&mut self, value: impl Into<String>) {
        if !self.in_flight {
            self.original_value = value.into();
        }
    }

    /// Display -> Editing. Returns false when already editing.
    pub fn begin_edit(&mut self, view: &dyn FieldView) -> bool {
        if self.mode == PresentationMode::Editing {
            return false;
        }
        view.show_editor();
        self.mode = PresentationMode::Editing;
        true
    }

    /// Editing -> Display, unconditionally
    pub fn end_edit(&mut self, view: &dyn FieldView) {
        view.show_display();
        self.mode = PresentationMode::Display;
    }

    pub fn is_significant_change(&self, new_value: &str) -> bool {
        is_significant(&self.original_value, new_value)
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric-aware change detection.
///
/// Two numbers compare by value, two non-numbers compare as text, and a
/// number against a non-number always counts as a change.
pub fn is_significant(original: &str, new_value: &str) -> bool {
    match (parse_number(original), parse_number(new_value)) {
        (Some(a), Some(b)) => a != b,
        (None, None) => original != new_value,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingView {
        calls: RefCell<Vec<&'static str>>,
    }

    impl FieldView for RecordingView {
        fn show_display(&self) {
            self.calls.borrow_mut().push("display");
        }
        fn show_editor(&self) {
            self.calls.borrow_mut().push("editor");
        }
        fn restore_input(&self, _value: &str) {
            self.calls.borrow_mut().push("restore");
        }
        fn set_busy(&self, _busy: bool) {
            self.calls.borrow_mut().push("busy");
        }
    }

    #[test]
    fn test_numeric_equal_is_not_significant() {
        assert!(!is_significant("5", "5.0"));
        assert!(!is_significant("2.50", " 2.5 "));
    }

    #[test]
    fn test_numeric_change_is_significant() {
        assert!(is_significant("5", "6"));
        assert!(is_significant("0", "-1"));
    }

    #[test]
    fn test_text_comparison() {
        assert!(!is_significant("Weekly order", "Weekly order"));
        assert!(is_significant("Weekly order", "Monthly order"));
    }

    #[test]
    fn test_mixed_is_significant() {
        assert!(is_significant("5", ""));
        assert!(is_significant("", "5"));
        assert!(is_significant("5", "five"));
    }

    #[test]
    fn test_toggle_round_trip() {
        let view = RecordingView::default();
        let mut field = EditableField::new(FieldKey::new("7", "quantity_done"), "2");
        assert_eq!(field.mode(), PresentationMode::Display);

        assert!(field.begin_edit(&view));
        assert_eq!(field.mode(), PresentationMode::Editing);
        assert!(!field.begin_edit(&view));

        field.end_edit(&view);
        assert_eq!(field.mode(), PresentationMode::Display);
        assert_eq!(*view.calls.borrow(), vec!["editor", "display"]);
    }

    #[test]
    fn test_end_edit_from_display_still_shows_display() {
        let view = RecordingView::default();
        let mut field = EditableField::new(FieldKey::new("7", "name"), "Cart");
        field.end_edit(&view);
        assert_eq!(*view.calls.borrow(), vec!["display"]);
    }

    #[test]
    fn test_refresh_original_skipped_while_in_flight() {
        let mut field = EditableField::new(FieldKey::new("1", "qty"), "2");
        field.set_in_flight(true);
        field.refresh_original("9");
        assert_eq!(field.original_value(), "2");
        field.set_in_flight(false);
        field.refresh_original("9");
        assert_eq!(field.original_value(), "9");
    }
}
