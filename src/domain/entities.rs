//! Domain entities. Pure data structures for the core business.
//!
//! No storage types here. Adapters map rows into these.

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a record id in hex characters (12 bytes).
const RECORD_ID_LEN: usize = 24;

/// Document-store identifier: 24 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        let bytes: [u8; RECORD_ID_LEN / 2] = rand::random();
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Parse an id. Surrounding whitespace and upper-case hex are accepted.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.len() != RECORD_ID_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidId(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Account being removed. Read-only to the cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    /// Media record holding the profile picture, if any.
    pub picture: Option<RecordId>,
}

/// Group chat. `members` order is significant: "first" creator selection uses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: RecordId,
    pub members: Vec<RecordId>,
    pub creator: RecordId,
    pub group_name: String,
}

impl Conversation {
    pub fn has_member(&self, user: &RecordId) -> bool {
        self.members.iter().any(|m| m == user)
    }
}

/// Uploaded file owned by a user. `uploaded_file_name` keys the files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub id: RecordId,
    pub owner: RecordId,
    pub uploaded_file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: RecordId,
    pub person1: RecordId,
    pub person2: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub sender: RecordId,
    pub conversation: RecordId,
    pub text: String,
}
