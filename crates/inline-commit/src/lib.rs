//! Inline Commit Protocol
//!
//! The edit-commit-reconcile loop shared by every portal widget family:
//! a field toggles between display and edit presentation, a significant
//! change is submitted to a remote route, and the reply is classified and
//! applied to the document.
//!
//! The crate never touches a real DOM or network. The host supplies a
//! [`CommandGateway`], a [`Surface`], [`FieldView`]s and [`ElementProbe`]s.

pub mod coordinator;
pub mod error;
pub mod family;
pub mod field;
pub mod gateway;
pub mod interpret;
pub mod reconcile;
pub mod region;


pub use coordinator::{CommitCoordinator, CommitReport, PendingCommit};
pub use error::{GatewayError, ParamError};
pub use family::{
    Behavior, ElementProbe, EventBinding, FieldCommitSpec, OperationSpec, OriginalValue,
    ParamSource, ParamSpec, RegionSpec, Trigger, ValueKind, WidgetFamily, ERRORS_REGION, FAMILIES,
};
pub use field::{is_significant, EditableField, FieldKey, FieldView, PresentationMode};
pub use gateway::{CommandGateway, Params, Primitive, RemoteCommand};
pub use interpret::{interpret, InterpretedResponse};
pub use reconcile::{Alert, Reconciled, RetryRequest, Settlement, Surface};
pub use region::{RegionBinding, RegionSet, Ticket, TicketPair};
