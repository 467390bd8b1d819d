// Password Vault - Caller Authentication
//
// Identifies the process connecting over the Unix domain socket from its
// peer credentials (SO_PEERCRED). The kernel vouches for the uid, so it
// serves as the authenticated caller identity for the local gateway.

use std::fmt;

use tokio::net::unix::UCred;

/// Information about the process that connected to the UDS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    /// User id of the peer process.
    pub uid: u32,
    /// Process id of the peer, when the platform reports it.
    pub pid: Option<u32>,
}

impl CallerInfo {
    pub fn from_ucred(cred: &UCred) -> Self {
        Self {
            uid: cred.uid(),
            pid: cred.pid().and_then(|pid| u32::try_from(pid).ok()),
        }
    }

    /// Identity handed to the vault service. Entries are partitioned by it.
    pub fn caller_id(&self) -> String {
        format!("uid:{}", self.uid)
    }
}

impl fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pid {
            Some(pid) => write!(f, "uid {} (PID {})", self.uid, pid),
            None => write!(f, "uid {}", self.uid),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
