// Password Vault - Unix Domain Socket Gateway
//
// Listens on a Unix domain socket for newline-delimited JSON requests from
// local clients. Each connection is handled in a spawned tokio task; the
// peer's credentials supply the caller identity, and each request runs on
// the blocking pool since store access is synchronous.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::error::PasswordVaultError;
use crate::store::EntryStore;
use crate::vault::{VaultError, VaultResponse, VaultService};

use super::caller::CallerInfo;
use super::protocol::{malformed_request, GatewayRequest};

/// Default socket path: `$XDG_RUNTIME_DIR/password-vault/vault.sock`
/// Falls back to `/tmp/password-vault/vault.sock`.
pub fn default_socket_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    runtime_dir.join("password-vault").join("vault.sock")
}

/// Unix Domain Socket gateway in front of a vault service.
pub struct UdsServer<S> {
    service: Arc<VaultService<S>>,
    socket_path: PathBuf,
}

impl<S: EntryStore + 'static> UdsServer<S> {
    pub fn new(service: Arc<VaultService<S>>, socket_path: PathBuf) -> Self {
        Self {
            service,
            socket_path,
        }
    }

    /// Start the gateway. This runs until the process is terminated.
    pub async fn run(&self) -> Result<(), PasswordVaultError> {
        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Remove stale socket file if it exists
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner-only access to the socket
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        tracing::info!(
            socket = %self.socket_path.display(),
            "Password vault gateway listening"
        );

        loop {
            let (stream, _addr) = listener.accept().await?;
            let service = Arc::clone(&self.service);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, service).await {
                    tracing::error!(error = %e, "Connection handler error");
                }
            });
        }
    }
}

/// Handle a single client connection.
async fn handle_connection<S: EntryStore + 'static>(
    stream: UnixStream,
    service: Arc<VaultService<S>>,
) -> Result<(), PasswordVaultError> {
    let caller = match stream.peer_cred() {
        Ok(cred) => Some(CallerInfo::from_ucred(&cred)),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read peer credentials");
            None
        }
    };

    if let Some(ref info) = caller {
        tracing::info!(%info, "Client connected");
    }

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let service = Arc::clone(&service);
        let caller = caller.clone();
        let response = tokio::task::spawn_blocking(move || {
            process_line(&line, &service, caller.as_ref())
        })
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Request task failed");
            VaultError::Store(crate::store::StoreError::Unavailable(e.to_string())).to_response()
        });

        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse one request line and run it through the service.
fn process_line<S: EntryStore>(
    raw: &str,
    service: &VaultService<S>,
    caller: Option<&CallerInfo>,
) -> VaultResponse {
    let request: GatewayRequest = match serde_json::from_str(raw) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed request line");
            return malformed_request();
        }
    };

    let caller_id = caller.map(CallerInfo::caller_id).unwrap_or_default();
    service.handle(request.into_vault_request(caller_id))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryEntryStore;
    use serde_json::Value;
    use std::time::Duration;

    fn service() -> VaultService<MemoryEntryStore> {
        VaultService::new(MemoryEntryStore::new())
    }

    fn alice() -> CallerInfo {
        CallerInfo {
            uid: 1000,
            pid: Some(1234),
        }
    }

    fn body(resp: &VaultResponse) -> Value {
        resp.body_json().unwrap()
    }

    #[test]
    fn test_process_create_and_get() {
        let svc = service();
        let create = r#"{"action":"createPassword","payload":{"encryptedData":"abc123","iv":"xyz789"}}"#;
        let resp = process_line(create, &svc, Some(&alice()));
        assert_eq!(resp.status_code, 201);
        let entry_id = body(&resp)["entryId"].as_str().unwrap().to_string();

        let get = format!(r#"{{"action":"getPassword","payload":{{"entryId":"{}"}}}}"#, entry_id);
        let resp = process_line(&get, &svc, Some(&alice()));
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp)["encryptedData"], "abc123");
    }

    #[test]
    fn test_entries_are_partitioned_by_peer_uid() {
        let svc = service();
        let create = r#"{"action":"createPassword","payload":{"encryptedData":"a","iv":"b"}}"#;
        let resp = process_line(create, &svc, Some(&alice()));
        let entry_id = body(&resp)["entryId"].as_str().unwrap().to_string();

        let bob = CallerInfo {
            uid: 1001,
            pid: None,
        };
        let get = format!(r#"{{"action":"getPassword","payload":{{"entryId":"{}"}}}}"#, entry_id);
        let resp = process_line(&get, &svc, Some(&bob));
        assert_eq!(resp.status_code, 404);
    }

    #[test]
    fn test_unidentified_peer_is_rejected() {
        let svc = service();
        let create = r#"{"action":"createPassword","payload":{"encryptedData":"a","iv":"b"}}"#;
        let resp = process_line(create, &svc, None);
        assert_eq!(resp.status_code, 400);
        assert!(svc.store().is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let svc = service();
        let resp = process_line("not json at all", &svc, Some(&alice()));
        assert_eq!(resp.status_code, 400);
        assert_eq!(body(&resp)["error"], "MalformedRequest");
    }

    #[test]
    fn test_unknown_action() {
        let svc = service();
        let resp = process_line(r#"{"action":"unknown_action"}"#, &svc, Some(&alice()));
        assert_eq!(resp.status_code, 404);
        assert_eq!(body(&resp)["message"], "Action not found");
    }

    #[test]
    fn test_default_socket_path() {
        let path = default_socket_path();
        assert!(path.to_string_lossy().contains("password-vault"));
        assert!(path.to_string_lossy().ends_with("vault.sock"));
    }

    #[tokio::test]
    async fn test_socket_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("vault.sock");
        let server = UdsServer::new(Arc::new(service()), socket_path.clone());
        let handle = tokio::spawn(async move { server.run().await });

        let mut stream = None;
        for _ in 0..50 {
            match UnixStream::connect(&socket_path).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
        let stream = stream.expect("gateway should accept connections");
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"action\":\"createPassword\",\"payload\":{\"encryptedData\":\"abc123\",\"iv\":\"xyz789\"}}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().expect("response line");
        let resp: VaultResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(resp.status_code, 201);
        let entry_id = body(&resp)["entryId"].as_str().unwrap().to_string();

        let get = format!(
            "{{\"action\":\"getPassword\",\"payload\":{{\"entryId\":\"{}\"}}}}\n",
            entry_id
        );
        writer.write_all(get.as_bytes()).await.unwrap();
        let line = lines.next_line().await.unwrap().expect("response line");
        let resp: VaultResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp)["iv"], "xyz789");

        writer.write_all(b"{broken\n").await.unwrap();
        let line = lines.next_line().await.unwrap().expect("response line");
        let resp: VaultResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(resp.status_code, 400);

        handle.abort();
    }
}
