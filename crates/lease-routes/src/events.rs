use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lease events the DHCP server calls the hook with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseEvent {
    Lease6Renew,
    Lease6Rebind,
    Lease6Expire,
    Lease6Recover,
    Leases6Committed,
    Lease6Release,
    Lease6Decline,
}

impl LeaseEvent {
    pub const ALL: [LeaseEvent; 7] = [
        LeaseEvent::Lease6Renew,
        LeaseEvent::Lease6Rebind,
        LeaseEvent::Lease6Expire,
        LeaseEvent::Lease6Recover,
        LeaseEvent::Leases6Committed,
        LeaseEvent::Lease6Release,
        LeaseEvent::Lease6Decline,
    ];

    /// Name passed as the hook argument.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lease6Renew => "lease6_renew",
            Self::Lease6Rebind => "lease6_rebind",
            Self::Lease6Expire => "lease6_expire",
            Self::Lease6Recover => "lease6_recover",
            Self::Leases6Committed => "leases6_committed",
            Self::Lease6Release => "lease6_release",
            Self::Lease6Decline => "lease6_decline",
        }
    }

    /// Log line prefix.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Lease6Renew => "RENEW",
            Self::Lease6Rebind => "REBIND",
            Self::Lease6Expire => "EXPIRE",
            Self::Lease6Recover => "RECOVER",
            Self::Leases6Committed => "COMMITTED",
            Self::Lease6Release => "RELEASE",
            Self::Lease6Decline => "DECLINE",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown lease event '{0}'")]
pub struct UnknownEvent(pub String);

impl FromStr for LeaseEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for LeaseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const QUERY6_REMOTE_ADDR: &str = "QUERY6_REMOTE_ADDR";
pub const LEASE6_ADDRESS: &str = "LEASE6_ADDRESS";
pub const LEASE6_PREFIX_LEN: &str = "LEASE6_PREFIX_LEN";
/// Address lease committed alongside the delegation; used as the gateway.
pub const LEASES6_AT0_ADDRESS: &str = "LEASES6_AT0_ADDRESS";
/// Delegated prefix.
pub const LEASES6_AT1_ADDRESS: &str = "LEASES6_AT1_ADDRESS";
pub const LEASES6_AT1_PREFIX_LEN: &str = "LEASES6_AT1_PREFIX_LEN";

const HOOK_VAR_PREFIXES: [&str; 6] = [
    "LEASE6_",
    "LEASES6_",
    "DELETED_LEASES6_",
    "QUERY6_",
    "RESPONSE6_",
    "SUBNET6_",
];

/// Hook variables exported by the DHCP server for one call.
#[derive(Debug, Clone, Default)]
pub struct LeaseEnv {
    vars: BTreeMap<String, String>,
}

impl LeaseEnv {
    pub fn from_process() -> Self {
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Keep only hook variables; the rest of the environment is ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| HOOK_VAR_PREFIXES.iter().any(|p| k.starts_with(p)))
            .collect();
        Self { vars }
    }

    /// Value of `name`; unset and empty are both `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for LeaseEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.vars.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}
