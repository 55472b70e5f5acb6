//! Reconciliation Strategy
//!
//! Applies an interpreted reply to the document through a [`Surface`].

use crate::coordinator::PendingCommit;
use crate::interpret::InterpretedResponse;
use crate::region::{RegionBinding, RegionSet, TicketPair};

/// How an operation's success is reflected in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Replace the named data region with the returned markup
    Replace(&'static str),
    /// The operation changes page-level state; reload the page
    Reload,
}

impl Settlement {
    pub fn data_region(&self) -> Option<&'static str> {
        match self {
            Settlement::Replace(region) => Some(region),
            Settlement::Reload => None,
        }
    }
}

/// A failed operation the user may send again
#[derive(Debug, Clone, PartialEq)]
pub struct RetryRequest {
    pub commit: PendingCommit,
    pub settlement: Settlement,
}

/// User-visible alert for the errors region
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub message: String,
    pub retry: Option<RetryRequest>,
}

impl Alert {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry: None,
        }
    }

    pub fn retryable(message: impl Into<String>, retry: RetryRequest) -> Self {
        Self {
            message: message.into(),
            retry: Some(retry),
        }
    }
}

/// The document operations reconciliation needs
pub trait Surface {
    /// Replace the whole content of `region` with trusted server markup
    fn replace_region(&self, region: &RegionBinding, markup: &str);
    fn clear_region(&self, region: &RegionBinding);
    /// Replace the whole content of `region` with `alert`
    fn show_alert(&self, region: &RegionBinding, alert: Alert);
    fn reload_page(&self);
}

/// What reconciliation did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    ErrorShown,
    Replaced,
    Reloaded,
    Unchanged,
    /// A newer reply already wrote the target region
    Superseded,
}

pub fn apply(
    result: InterpretedResponse,
    settlement: Settlement,
    regions: &RegionSet,
    tickets: TicketPair,
    surface: &dyn Surface,
) -> Reconciled {
    match (result, settlement) {
        (InterpretedResponse::StructuredError { message }, _) => {
            if !regions.errors().admit_alert(tickets.errors) {
                log::warn!("error reply superseded by a newer alert: {}", message);
                return Reconciled::Superseded;
            }
            surface.show_alert(regions.errors(), Alert::rejected(message));
            Reconciled::ErrorShown
        }
        (InterpretedResponse::ReplacementContent { markup }, Settlement::Replace(name)) => {
            let (Some(region), Some(ticket)) = (regions.get(name), tickets.data) else {
                log::warn!("no region bound as `{}`", name);
                return Reconciled::Unchanged;
            };
            if !region.admit(ticket) {
                log::warn!("stale reply for `{}` dropped", name);
                return Reconciled::Superseded;
            }
            if regions.errors().admit(tickets.errors) {
                surface.clear_region(regions.errors());
            }
            surface.replace_region(region, &markup);
            Reconciled::Replaced
        }
        (InterpretedResponse::Ambiguous, Settlement::Replace(name)) => {
            log::warn!("reply for `{}` carried no content, document left as is", name);
            Reconciled::Unchanged
        }
        (_, Settlement::Reload) => {
            surface.reload_page();
            Reconciled::Reloaded
        }
    }
}
