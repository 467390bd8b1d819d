// Password Vault - Gateway Line Protocol
//
// One JSON object per line in each direction. Requests carry the action and
// payload only; the caller identity is attached by the gateway from the
// socket's peer credentials and can never be supplied by the client.

use serde::Deserialize;

use crate::vault::{RequestPayload, ResponseBody, VaultRequest, VaultResponse};

/// A request line as sent by a local client.
#[derive(Debug, Deserialize)]
pub struct GatewayRequest {
    pub action: String,
    #[serde(default)]
    pub payload: RequestPayload,
}

impl GatewayRequest {
    /// Attach the authenticated identity. `caller_id` is empty when the
    /// peer could not be identified; the service rejects such requests.
    pub fn into_vault_request(self, caller_id: String) -> VaultRequest {
        VaultRequest::new(caller_id, self.action, self.payload)
    }
}

/// Response for a line that is not a valid request.
pub fn malformed_request() -> VaultResponse {
    VaultResponse::json(
        400,
        &ResponseBody::new("Malformed request").with_error("MalformedRequest"),
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
