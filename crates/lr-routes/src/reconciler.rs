//! Keeps switch routes in line with committed prefix delegations.

use tracing::{debug, error, info, warn};

use crate::remote::{RemoteExecutor, RouteCommand};
use crate::store::RouteStore;
use crate::types::{StoreResult, UpsertOutcome};

const MAX_PREFIX_LEN: u8 = 128;

/// Decision taken for a committed delegation.
///
/// Describes what was sent to the switch. A route cache write that fails
/// afterwards is logged and does not change the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No cached route; route added on the switch.
    Added,
    /// Cached gateway differed; old route deleted and new one added.
    Updated,
    /// Cached route already correct; nothing sent.
    Unchanged,
    /// Incomplete lease data; nothing done.
    Skipped,
}

pub struct Reconciler<'a, E> {
    store: &'a RouteStore,
    executor: &'a E,
}

impl<'a, E: RemoteExecutor> Reconciler<'a, E> {
    pub fn new(store: &'a RouteStore, executor: &'a E) -> Self {
        Self { store, executor }
    }

    /// Reconcile the route for `prefix/prefix_len` via `gateway` on `switch`.
    ///
    /// Callers only pass managed switches. Empty values count as missing.
    /// Errors are route cache read failures (including a malformed file);
    /// a failed write after the switch was updated is only logged, and the
    /// returned outcome still reports the remote action.
    pub async fn handle_commit(
        &self,
        switch: &str,
        prefix: Option<&str>,
        prefix_len: Option<&str>,
        gateway: Option<&str>,
    ) -> StoreResult<CommitOutcome> {
        let (Some(prefix), Some(prefix_len_raw), Some(gateway)) = (
            prefix.filter(|s| !s.is_empty()),
            prefix_len.filter(|s| !s.is_empty()),
            gateway.filter(|s| !s.is_empty()),
        ) else {
            warn!(
                "COMMITTED - LEASES6_AT1_ADDRESS, LEASES6_AT1_PREFIX_LEN, or LEASES6_AT0_ADDRESS is empty. Skipping route operations."
            );
            return Ok(CommitOutcome::Skipped);
        };

        let Some(prefix_len) = parse_prefix_len(prefix_len_raw) else {
            warn!(
                prefix,
                prefix_len = prefix_len_raw,
                "COMMITTED - Invalid prefix length. Skipping route operations."
            );
            return Ok(CommitOutcome::Skipped);
        };

        // an empty cached gateway has no route to remove
        let cached = self
            .store
            .lookup(prefix, prefix_len)?
            .filter(|g| !g.is_empty());
        let outcome = match cached {
            Some(cached) if cached == gateway => {
                info!(
                    "COMMITTED - Route {prefix}/{prefix_len} already exists with correct gateway. Skipping."
                );
                return Ok(CommitOutcome::Unchanged);
            }
            Some(cached) => {
                let del = RouteCommand::delete(prefix, prefix_len, &cached);
                info!(switch, "COMMITTED - Removing old route: {del}");
                self.send(switch, &del).await;
                CommitOutcome::Updated
            }
            None => CommitOutcome::Added,
        };

        let add = RouteCommand::add(prefix, prefix_len, gateway);
        info!(switch, "COMMITTED - Adding/Updating route: {add}");
        self.send(switch, &add).await;

        match self.store.upsert(prefix, prefix_len, gateway) {
            Ok(UpsertOutcome::Unchanged) => {
                info!("COMMITTED - Route {prefix}/{prefix_len} already recorded in JSON file");
            }
            Ok(_) => info!("COMMITTED - Route added/updated in JSON file"),
            Err(e) if e.is_malformed() => return Err(e),
            Err(e) => error!("COMMITTED - Failed to update JSON file: {e}"),
        }

        Ok(outcome)
    }

    async fn send(&self, switch: &str, command: &RouteCommand) {
        let command = command.to_string();
        match self.executor.run(switch, &command).await {
            Ok(output) if output.success() => {
                debug!(switch, command = %command, "COMMITTED - Remote command succeeded");
            }
            Ok(output) => {
                warn!(
                    switch,
                    command = %command,
                    exit_code = ?output.exit_code,
                    stderr = %output.stderr,
                    "COMMITTED - Remote command failed"
                );
            }
            Err(e) => error!(switch, command = %command, "COMMITTED - {e}"),
        }
    }
}

fn parse_prefix_len(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|len| *len <= MAX_PREFIX_LEN)
}
