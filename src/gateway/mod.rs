// Password Vault - Gateway Module
//
// Local stand-in for the external API gateway: a Unix Domain Socket server
// that authenticates peers by their OS credentials and forwards
// newline-delimited JSON requests to the vault service.

mod caller;
mod protocol;
mod uds;

pub use caller::CallerInfo;
pub use protocol::{malformed_request, GatewayRequest};
pub use uds::{default_socket_path, UdsServer};
