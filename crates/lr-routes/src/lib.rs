pub mod config;
pub mod reconciler;
pub mod remote;
pub mod store;
pub mod types;

pub use config::Config;
pub use reconciler::{CommitOutcome, Reconciler};
pub use remote::{RemoteError, RemoteExecutor, RemoteOutput, RouteCommand, SshExecutor};
pub use store::RouteStore;
pub use types::{RouteRecord, StoreError, StoreResult, UpsertOutcome};
