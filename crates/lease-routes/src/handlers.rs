//! Per-event hook handlers.

use anyhow::Result;
use lr_routes::{Config, Reconciler, RemoteExecutor, RouteStore};
use tracing::{debug, info};

use crate::events::{
    LEASE6_ADDRESS, LEASE6_PREFIX_LEN, LEASES6_AT0_ADDRESS, LEASES6_AT1_ADDRESS,
    LEASES6_AT1_PREFIX_LEN, LeaseEnv, LeaseEvent, QUERY6_REMOTE_ADDR,
};

/// Run the handler for `event`; the return value is the process exit status.
pub async fn dispatch<E: RemoteExecutor>(
    event: LeaseEvent,
    env: &LeaseEnv,
    config: &Config,
    store: &RouteStore,
    executor: &E,
) -> Result<i32> {
    let tag = event.tag();
    match event {
        LeaseEvent::Lease6Renew => {
            info!(
                "{tag} - {}/{} by {}",
                env.get(LEASE6_ADDRESS).unwrap_or("-"),
                env.get(LEASE6_PREFIX_LEN).unwrap_or("-"),
                env.get(QUERY6_REMOTE_ADDR).unwrap_or("-"),
            );
            debug!("{tag} - {env}");
        }
        LeaseEvent::Lease6Rebind | LeaseEvent::Lease6Expire | LeaseEvent::Lease6Recover => {
            debug!("{tag} - {env}");
        }
        LeaseEvent::Lease6Release | LeaseEvent::Lease6Decline => {
            info!("{tag} - {env}");
        }
        LeaseEvent::Leases6Committed => {
            leases6_committed(env, config, store, executor).await?;
        }
    }
    Ok(0)
}

async fn leases6_committed<E: RemoteExecutor>(
    env: &LeaseEnv,
    config: &Config,
    store: &RouteStore,
    executor: &E,
) -> Result<()> {
    let Some(switch) = env
        .get(QUERY6_REMOTE_ADDR)
        .filter(|addr| config.is_managed_switch(addr))
    else {
        debug!(
            remote = env.get(QUERY6_REMOTE_ADDR).unwrap_or("-"),
            "COMMITTED - Query not relayed by a managed switch, ignoring"
        );
        return Ok(());
    };

    let outcome = Reconciler::new(store, executor)
        .handle_commit(
            switch,
            env.get(LEASES6_AT1_ADDRESS),
            env.get(LEASES6_AT1_PREFIX_LEN),
            env.get(LEASES6_AT0_ADDRESS),
        )
        .await?;
    debug!(switch, ?outcome, "COMMITTED - Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lr_routes::{RemoteError, RemoteOutput, RouteRecord};
    use std::path::PathBuf;
    use std::sync::Mutex;

    const SWITCH: &str = "2001:db8:ffff::1";

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
    }

    impl RemoteExecutor for RecordingExecutor {
        async fn run(&self, target: &str, command: &str) -> Result<RemoteOutput, RemoteError> {
            self.calls.lock().unwrap().push(format!("{target}: {command}"));
            Ok(RemoteOutput {
                exit_code: Some(0),
                ..Default::default()
            })
        }
    }

    fn config(routes_file: PathBuf) -> Config {
        Config {
            routes_file,
            log_file: PathBuf::from("/dev/null"),
            ssh_identity_file: PathBuf::from("/etc/kea/id_ed25519"),
            ssh_username: "kea".to_string(),
            managed_switches: vec![SWITCH.to_string()],
        }
    }

    fn committed_env(remote: &str, prefix: &str) -> LeaseEnv {
        LeaseEnv::from_vars([
            (QUERY6_REMOTE_ADDR, remote),
            (LEASES6_AT0_ADDRESS, "2001:db8:ffff::100"),
            (LEASES6_AT1_ADDRESS, prefix),
            (LEASES6_AT1_PREFIX_LEN, "56"),
        ])
    }

    #[tokio::test]
    async fn test_committed_managed_switch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("routes.json"));
        let store = RouteStore::new(&config.routes_file);
        let exec = RecordingExecutor::default();

        let env = committed_env(SWITCH, "2001:db8:100::");
        let code = dispatch(LeaseEvent::Leases6Committed, &env, &config, &store, &exec)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            *exec.calls.lock().unwrap(),
            vec![format!(
                "{SWITCH}: sudo ip route add 2001:db8:100::/56 via 2001:db8:ffff::100"
            )]
        );
        assert_eq!(
            store.load().unwrap(),
            vec![RouteRecord::new("2001:db8:100::", 56, "2001:db8:ffff::100")]
        );

        // same commit again is a no-op
        dispatch(LeaseEvent::Leases6Committed, &env, &config, &store, &exec)
            .await
            .unwrap();
        assert_eq!(exec.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_committed_unmanaged_switch_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("routes.json"));
        let store = RouteStore::new(&config.routes_file);
        let exec = RecordingExecutor::default();

        for remote in ["2001:db8:ffff::9", ""] {
            let env = committed_env(remote, "2001:db8:100::");
            let code = dispatch(LeaseEvent::Leases6Committed, &env, &config, &store, &exec)
                .await
                .unwrap();
            assert_eq!(code, 0);
        }

        assert!(exec.calls.lock().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_committed_missing_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("routes.json"));
        let store = RouteStore::new(&config.routes_file);
        let exec = RecordingExecutor::default();

        let env = committed_env(SWITCH, "");
        let code = dispatch(LeaseEvent::Leases6Committed, &env, &config, &store, &exec)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(exec.calls.lock().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_committed_malformed_cache_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("routes.json"));
        std::fs::write(&config.routes_file, "{").unwrap();
        let store = RouteStore::new(&config.routes_file);
        let exec = RecordingExecutor::default();

        let env = committed_env(SWITCH, "2001:db8:100::");
        let result = dispatch(LeaseEvent::Leases6Committed, &env, &config, &store, &exec).await;

        assert!(result.is_err());
        assert!(exec.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_events_touch_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path().join("routes.json"));
        let store = RouteStore::new(&config.routes_file);
        let exec = RecordingExecutor::default();
        let env = committed_env(SWITCH, "2001:db8:100::");

        for event in LeaseEvent::ALL {
            if event == LeaseEvent::Leases6Committed {
                continue;
            }
            let code = dispatch(event, &env, &config, &store, &exec).await.unwrap();
            assert_eq!(code, 0);
            // renew with none of its variables set must not fail either
            let code = dispatch(event, &LeaseEnv::default(), &config, &store, &exec)
                .await
                .unwrap();
            assert_eq!(code, 0);
        }

        assert!(exec.calls.lock().unwrap().is_empty());
        assert!(!store.path().exists());
    }
}
