//! Prefixed identifier generation
//!
//! Generated identifiers take the form `PREFIX_XXXXXXXX`: an uppercase
//! prefix naming the record family and the first eight hex characters of
//! a random UUID, uppercased.

use uuid::Uuid;

/// Generate a `PREFIX_XXXXXXXX` identifier
pub fn prefixed_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, hex[..8].to_uppercase())
}
