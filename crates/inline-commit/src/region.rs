//! Region Bindings
//!
//! Named document containers that reconciliation clears and repopulates.
//! The name-to-selector mapping is fixed at mount time; each binding also
//! hands out write tickets so an older reply never overwrites content
//! written by a newer one.

use std::cell::Cell;

/// Write permission taken when an operation is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct RegionBinding {
    name: String,
    selector: String,
    issued: Cell<u64>,
    written: Cell<u64>,
    alerted: Cell<u64>,
}

impl RegionBinding {
    pub fn new(name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            issued: Cell::new(0),
            written: Cell::new(0),
            alerted: Cell::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn issue(&self) -> Ticket {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        Ticket(next)
    }

    /// Claim the region for a write. False when a newer ticket already wrote.
    pub fn admit(&self, ticket: Ticket) -> bool {
        if ticket.0 < self.written.get() {
            return false;
        }
        self.written.set(ticket.0);
        true
    }

    /// Claim the region for an alert. Only a newer alert supersedes an
    /// alert; a newer clear or replacement does not. Once shown, older
    /// writes can no longer clear it.
    pub fn admit_alert(&self, ticket: Ticket) -> bool {
        if ticket.0 < self.alerted.get() {
            return false;
        }
        self.alerted.set(ticket.0);
        self.written.set(self.written.get().max(ticket.0));
        true
    }
}

/// Tickets taken for one operation
#[derive(Debug, Clone, Copy)]
pub struct TicketPair {
    pub errors: Ticket,
    pub data: Option<Ticket>,
}

/// The errors region plus the data regions of one widget instance
#[derive(Debug)]
pub struct RegionSet {
    errors: RegionBinding,
    data: Vec<RegionBinding>,
}

pub const ERRORS_REGION_NAME: &str = "errors";

impl RegionSet {
    pub fn new(errors_selector: impl Into<String>) -> Self {
        Self {
            errors: RegionBinding::new(ERRORS_REGION_NAME, errors_selector),
            data: Vec::new(),
        }
    }

    pub fn with_region(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.data.push(RegionBinding::new(name, selector));
        self
    }

    pub fn errors(&self) -> &RegionBinding {
        &self.errors
    }

    pub fn get(&self, name: &str) -> Option<&RegionBinding> {
        self.data.iter().find(|region| region.name() == name)
    }

    pub fn data_regions(&self) -> impl Iterator<Item = &RegionBinding> {
        self.data.iter()
    }

    pub fn issue(&self, data_region: Option<&str>) -> TicketPair {
        TicketPair {
            errors: self.errors.issue(),
            data: data_region.and_then(|name| self.get(name)).map(RegionBinding::issue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickets_are_monotonic() {
        let region = RegionBinding::new("details", "#details");
        let first = region.issue();
        let second = region.issue();
        assert!(first < second);
    }

    #[test]
    fn test_stale_ticket_rejected_after_newer_write() {
        let region = RegionBinding::new("details", "#details");
        let first = region.issue();
        let second = region.issue();

        assert!(region.admit(second));
        assert!(!region.admit(first));
    }

    #[test]
    fn test_in_order_writes_admitted() {
        let region = RegionBinding::new("details", "#details");
        let first = region.issue();
        let second = region.issue();

        assert!(region.admit(first));
        assert!(region.admit(second));
    }

    #[test]
    fn test_alert_survives_newer_clear() {
        let errors = RegionBinding::new("errors", "#edit_errors");
        let rejected = errors.issue();
        let searched = errors.issue();

        assert!(errors.admit(searched));
        assert!(errors.admit_alert(rejected));
    }

    #[test]
    fn test_older_write_cannot_clear_newer_alert() {
        let errors = RegionBinding::new("errors", "#edit_errors");
        let saved = errors.issue();
        let rejected = errors.issue();

        assert!(errors.admit_alert(rejected));
        assert!(!errors.admit(saved));
    }

    #[test]
    fn test_newer_alert_supersedes_older_alert() {
        let errors = RegionBinding::new("errors", "#edit_errors");
        let first = errors.issue();
        let second = errors.issue();

        assert!(errors.admit_alert(second));
        assert!(!errors.admit_alert(first));
    }

    #[test]
    fn test_region_set_lookup() {
        let regions = RegionSet::new("#edit_errors")
            .with_region("product_list", "#purchase_request_product_list")
            .with_region("details", "#purchase_request_details_list");

        assert_eq!(regions.errors().selector(), "#edit_errors");
        assert_eq!(regions.get("details").map(|r| r.selector()), Some("#purchase_request_details_list"));
        assert!(regions.get("cart").is_none());

        let tickets = regions.issue(Some("cart"));
        assert!(tickets.data.is_none());
    }
}
