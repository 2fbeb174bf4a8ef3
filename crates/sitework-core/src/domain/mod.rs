//! Domain model (IDs, references, state, transactions, templates, errors).

pub mod errors;
pub mod ids;
pub mod refs;
pub mod state;
pub mod template;
pub mod transaction;

pub use errors::{Resolving, StoreError, WorkError, WorkerError};
pub use ids::{ConnectionId, Id, IdMarker, ObjectId, TxnId, WorkerId};
pub use refs::{SiteRef, TargetRef, UserIdentity};
pub use state::WorkerState;
pub use template::{TemplateVars, render};
pub use transaction::{TransactionMeta, TransactionRecord};
