//! Commit Coordinator
//!
//! Decides whether a change is worth sending, issues the remote command and
//! routes the reply through the interpreter to reconciliation. Every outcome
//! ends in a document update or a no-op; nothing is returned as an error.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::field::{EditableField, FieldKey, FieldView};
use crate::gateway::{CommandGateway, RemoteCommand};
use crate::interpret::interpret;
use crate::reconcile::{self, Alert, Reconciled, RetryRequest, Settlement, Surface};
use crate::region::RegionSet;

/// One in-flight remote update
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub command: RemoteCommand,
    /// Field that spawned the commit, if any
    pub owner: Option<FieldKey>,
}

/// Outcome of one commit attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReport {
    /// The value did not change; no remote call
    Insignificant,
    /// The field already has a commit in flight; no remote call
    AlreadyInFlight,
    Settled(Reconciled),
    /// The call failed; a retry alert was offered
    TransportFailed,
}

pub struct CommitCoordinator<G> {
    gateway: G,
    regions: RegionSet,
    surface: Rc<dyn Surface>,
    /// Owners of the field commits awaiting a reply
    pending_owners: RefCell<BTreeSet<FieldKey>>,
}

impl<G: CommandGateway> CommitCoordinator<G> {
    pub fn new(gateway: G, regions: RegionSet, surface: Rc<dyn Surface>) -> Self {
        Self {
            gateway,
            regions,
            surface,
            pending_owners: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    /// Commit `new_value` for `field` if it differs from the server value.
    ///
    /// The caller has already returned the field to display mode. The
    /// editor input is restored to the server value unless the reply
    /// replaced the region.
    pub async fn commit_field(
        &self,
        field: &RefCell<EditableField>,
        view: &dyn FieldView,
        new_value: &str,
        command: RemoteCommand,
        settlement: Settlement,
    ) -> CommitReport {
        let owner = {
            let field = field.borrow();
            if field.is_in_flight() {
                log::debug!("{:?} still pending, edit ignored", field.key());
                return CommitReport::AlreadyInFlight;
            }
            if !field.is_significant_change(new_value) {
                log::debug!("{:?} unchanged, nothing to send", field.key());
                return CommitReport::Insignificant;
            }
            field.key().clone()
        };

        let pending = PendingCommit {
            command,
            owner: Some(owner),
        };
        self.settle_field(field, view, pending, settlement).await
    }

    /// Re-issue a failed field commit under the same in-flight guard and
    /// busy marking as [`commit_field`](Self::commit_field)
    pub async fn retry_field(
        &self,
        field: &RefCell<EditableField>,
        view: &dyn FieldView,
        request: RetryRequest,
    ) -> CommitReport {
        if field.borrow().is_in_flight() {
            log::debug!("{:?} still pending, retry ignored", field.borrow().key());
            return CommitReport::AlreadyInFlight;
        }
        self.settle_field(field, view, request.commit, request.settlement).await
    }

    /// Send an operation that is not tied to a field edit (add, delete,
    /// validate). Always fires.
    pub async fn submit(&self, command: RemoteCommand, settlement: Settlement) -> CommitReport {
        self.dispatch(PendingCommit { command, owner: None }, settlement).await
    }

    /// Re-query a list region. Always fires; a newer query's reply always
    /// wins over an older one.
    pub async fn query(&self, command: RemoteCommand, region: &'static str) -> CommitReport {
        self.dispatch(PendingCommit { command, owner: None }, Settlement::Replace(region))
            .await
    }

    /// Re-issue an operation offered by a retry alert. A field-owned
    /// commit is still refused while its owner has another commit pending.
    pub async fn retry(&self, request: RetryRequest) -> CommitReport {
        self.dispatch(request.commit, request.settlement).await
    }

    async fn settle_field(
        &self,
        field: &RefCell<EditableField>,
        view: &dyn FieldView,
        pending: PendingCommit,
        settlement: Settlement,
    ) -> CommitReport {
        field.borrow_mut().set_in_flight(true);
        view.set_busy(true);
        let report = self.dispatch(pending, settlement).await;
        view.set_busy(false);

        let mut field = field.borrow_mut();
        field.set_in_flight(false);
        if report != CommitReport::Settled(Reconciled::Replaced) {
            view.restore_input(field.original_value());
        }
        report
    }

    /// Send `pending` unless its owner already has a commit awaiting a reply
    async fn dispatch(&self, pending: PendingCommit, settlement: Settlement) -> CommitReport {
        let owner = pending.owner.clone();
        if let Some(owner) = &owner {
            if !self.pending_owners.borrow_mut().insert(owner.clone()) {
                log::debug!("{:?} still pending, commit ignored", owner);
                return CommitReport::AlreadyInFlight;
            }
        }

        let report = self.send(pending, settlement).await;

        if let Some(owner) = &owner {
            self.pending_owners.borrow_mut().remove(owner);
        }
        report
    }

    async fn send(&self, pending: PendingCommit, settlement: Settlement) -> CommitReport {
        let tickets = self.regions.issue(settlement.data_region());
        log::debug!("invoking {} {:?}", pending.command.route, pending.command.params);

        match self.gateway.invoke(&pending.command).await {
            Ok(body) => {
                let result = interpret(&body);
                let reconciled =
                    reconcile::apply(result, settlement, &self.regions, tickets, &*self.surface);
                log::debug!("{} settled: {:?}", pending.command.route, reconciled);
                CommitReport::Settled(reconciled)
            }
            Err(err) => {
                log::warn!("{} failed: {}", pending.command.route, err);
                if self.regions.errors().admit_alert(tickets.errors) {
                    let message = err.user_message();
                    self.surface.show_alert(
                        self.regions.errors(),
                        Alert::retryable(message, RetryRequest { commit: pending, settlement }),
                    );
                }
                CommitReport::TransportFailed
            }
        }
    }
}
