//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters. One trait per collection so use cases only see the
//! operations they need.

use crate::domain::{Conversation, DomainError, Media, RecordId, User};

/// User collection. Read-only to the cleanup.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &RecordId) -> Result<Option<User>, DomainError>;
}

/// Friendship collection.
#[async_trait::async_trait]
pub trait FriendshipStore: Send + Sync {
    /// Delete every friendship where the user is `person1` or `person2`. Returns the count.
    async fn delete_friendships_of(&self, user: &RecordId) -> Result<u64, DomainError>;
}

/// Media collection (records only; files are handled by [`MediaFiles`]).
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn find_media_by_owner(&self, owner: &RecordId) -> Result<Vec<Media>, DomainError>;

    async fn find_media(&self, id: &RecordId) -> Result<Option<Media>, DomainError>;

    async fn delete_media(&self, id: &RecordId) -> Result<(), DomainError>;
}

/// Message collection.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Delete every message sent by the user. Returns the count.
    async fn delete_messages_from(&self, sender: &RecordId) -> Result<u64, DomainError>;
}

/// Conversation collection.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversations where the user is a member OR the creator, in storage order.
    async fn find_conversations_of(
        &self,
        user: &RecordId,
    ) -> Result<Vec<Conversation>, DomainError>;

    /// Insert or replace the conversation by id.
    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), DomainError>;

    async fn delete_conversation(&self, id: &RecordId) -> Result<(), DomainError>;
}

/// Filesystem side of media removal. Moves files into the "deleted" area, keyed by
/// stored file name.
#[async_trait::async_trait]
pub trait MediaFiles: Send + Sync {
    /// Move the original upload.
    async fn relocate_upload(&self, file_name: &str) -> Result<(), DomainError>;

    /// Move the rescaled variant of an upload.
    async fn relocate_rescaled(&self, file_name: &str) -> Result<(), DomainError>;

    async fn relocate_profile_picture(&self, file_name: &str) -> Result<(), DomainError>;
}
