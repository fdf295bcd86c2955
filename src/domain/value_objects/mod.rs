mod client_identity;
mod content_key;

pub use client_identity::ClientIdentity;
pub use content_key::{ContentKey, KeyKind, FULL_KEY_LEN, SHORT_KEY_LEN};
