// Password Vault - Vault Service Module
//
// Action dispatch, ownership enforcement, id generation and timestamping
// on top of an injected item store.

mod error;
mod protocol;
mod service;

pub use error::VaultError;
pub use protocol::{
    Action, EntryView, RequestPayload, ResponseBody, Timestamps, VaultRequest, VaultResponse,
    CONTENT_TYPE,
};
pub use service::{Clock, SystemClock, VaultService, STATUS_CREATED, STATUS_OK};
