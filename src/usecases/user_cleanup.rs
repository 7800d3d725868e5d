//! Cascading cleanup after a user account is deleted.
//!
//! Loads the user, then runs friendship, media, message, conversation and (when the user
//! has one) profile-picture removal concurrently on the current task. Every subtask
//! handles and logs its own failures, so once the user is loaded the cleanup always
//! settles successfully; per-task results are returned in a `CleanupReport`.

use crate::domain::{DomainError, Media, ReconcileOptions, RecordId, User};
use crate::ports::{
    CleanupSink, ConversationStore, FriendshipStore, MediaFiles, MediaStore, MessageStore,
    UserStore,
};
use crate::usecases::conversation_reconciler::ConversationReconciler;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// The collections touched by a cleanup.
#[derive(Clone)]
pub struct CleanupStores {
    pub users: Arc<dyn UserStore>,
    pub friendships: Arc<dyn FriendshipStore>,
    pub media: Arc<dyn MediaStore>,
    pub messages: Arc<dyn MessageStore>,
    pub conversations: Arc<dyn ConversationStore>,
}

impl CleanupStores {
    /// Use one backend for every collection.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: UserStore + FriendshipStore + MediaStore + MessageStore + ConversationStore + 'static,
    {
        Self {
            users: Arc::clone(&store) as Arc<dyn UserStore>,
            friendships: Arc::clone(&store) as Arc<dyn FriendshipStore>,
            media: Arc::clone(&store) as Arc<dyn MediaStore>,
            messages: Arc::clone(&store) as Arc<dyn MessageStore>,
            conversations: store as Arc<dyn ConversationStore>,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupTask {
    Friendships,
    Media,
    Messages,
    Conversations,
    ProfilePicture,
}

impl fmt::Display for CleanupTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Friendships => "friendships",
            Self::Media => "media",
            Self::Messages => "messages",
            Self::Conversations => "conversations",
            Self::ProfilePicture => "profile_picture",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed { affected: u64 },
    /// Some items were removed, others failed and were left in place.
    Partial { affected: u64, failed: u64 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: CleanupTask,
    pub status: TaskStatus,
}

impl TaskOutcome {
    fn new(task: CleanupTask, status: TaskStatus) -> Self {
        Self { task, status }
    }
}

/// Result of one `cleanup_user` call, one entry per launched task.
#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub user_id: RecordId,
    pub outcomes: Vec<TaskOutcome>,
}

impl CleanupReport {
    pub fn all_completed(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o.status, TaskStatus::Completed { .. }))
    }

    pub fn status(&self, task: CleanupTask) -> Option<&TaskStatus> {
        self.outcomes
            .iter()
            .find(|o| o.task == task)
            .map(|o| &o.status)
    }
}

/// Orchestrates the removal of a user's footprint.
pub struct UserCleanupService {
    stores: CleanupStores,
    files: Arc<dyn MediaFiles>,
    sink: Arc<dyn CleanupSink>,
    reconciler: ConversationReconciler,
    options: ReconcileOptions,
}

impl UserCleanupService {
    pub fn new(
        stores: CleanupStores,
        files: Arc<dyn MediaFiles>,
        sink: Arc<dyn CleanupSink>,
        options: ReconcileOptions,
    ) -> Self {
        let reconciler =
            ConversationReconciler::new(Arc::clone(&stores.conversations), Arc::clone(&sink));
        Self {
            stores,
            files,
            sink,
            reconciler,
            options,
        }
    }

    /// Remove everything the user left behind.
    ///
    /// Fails only when the id is missing or malformed, or the user cannot be loaded.
    /// Subtask failures are logged and reported in the returned `CleanupReport`.
    pub async fn cleanup_user(&self, user_id: &str) -> Result<CleanupReport, DomainError> {
        let user = match self.load_user(user_id).await {
            Ok(user) => user,
            Err(e) => {
                self.sink.error("Error during user cleanup:", &e.to_string());
                return Err(e);
            }
        };
        let id = &user.id;
        info!(user_id = %id, has_picture = user.picture.is_some(), "starting user cleanup");

        let (friendships, media, messages, conversations, picture) = tokio::join!(
            self.remove_friendships(id),
            self.remove_media(id),
            self.remove_messages(id),
            self.remove_from_conversations(id),
            async {
                match &user.picture {
                    Some(picture) => Some(self.remove_profile_picture(picture).await),
                    None => None,
                }
            },
        );

        let mut outcomes = vec![friendships, media, messages, conversations];
        outcomes.extend(picture);
        let report = CleanupReport {
            user_id: user.id.clone(),
            outcomes,
        };

        for outcome in &report.outcomes {
            if !matches!(outcome.status, TaskStatus::Completed { .. }) {
                warn!(
                    user_id = %id,
                    task = %outcome.task,
                    status = ?outcome.status,
                    "cleanup task did not complete"
                );
            }
        }
        self.sink.info("User cleanup completed successfully");
        Ok(report)
    }

    async fn load_user(&self, user_id: &str) -> Result<User, DomainError> {
        if user_id.trim().is_empty() {
            return Err(DomainError::MissingUserId);
        }
        let id = RecordId::parse(user_id)?;
        self.stores
            .users
            .find_user(&id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))
    }

    async fn remove_friendships(&self, user: &RecordId) -> TaskOutcome {
        let status = match self.stores.friendships.delete_friendships_of(user).await {
            Ok(affected) => {
                self.sink.info("User friendships removed successfully");
                TaskStatus::Completed { affected }
            }
            Err(e) => {
                self.sink.error("Error deleting friendships:", &e.to_string());
                TaskStatus::Failed(e.to_string())
            }
        };
        TaskOutcome::new(CleanupTask::Friendships, status)
    }

    /// Relocates each media file pair then deletes its record. A failing item is logged
    /// and skipped; its record is kept so the files can be recovered.
    async fn remove_media(&self, user: &RecordId) -> TaskOutcome {
        let items = match self.stores.media.find_media_by_owner(user).await {
            Ok(items) => items,
            Err(e) => {
                self.sink.error("Error deleting media:", &e.to_string());
                return TaskOutcome::new(CleanupTask::Media, TaskStatus::Failed(e.to_string()));
            }
        };
        if items.is_empty() {
            self.sink.info("No user media.");
            return TaskOutcome::new(CleanupTask::Media, TaskStatus::Completed { affected: 0 });
        }

        let mut affected = 0u64;
        let mut failed = 0u64;
        for item in &items {
            match self.remove_one_media(item).await {
                Ok(()) => {
                    affected += 1;
                    self.sink.info(&format!(
                        "Media {} deleted successfully",
                        item.uploaded_file_name
                    ));
                }
                Err(e) => {
                    failed += 1;
                    self.sink.error("Error deleting files:", &e.to_string());
                }
            }
        }
        self.sink.info("All user media removed successfully");

        let status = if failed == 0 {
            TaskStatus::Completed { affected }
        } else {
            TaskStatus::Partial { affected, failed }
        };
        TaskOutcome::new(CleanupTask::Media, status)
    }

    async fn remove_one_media(&self, item: &Media) -> Result<(), DomainError> {
        self.files.relocate_upload(&item.uploaded_file_name).await?;
        self.files.relocate_rescaled(&item.uploaded_file_name).await?;
        self.stores.media.delete_media(&item.id).await
    }

    async fn remove_messages(&self, user: &RecordId) -> TaskOutcome {
        let status = match self.stores.messages.delete_messages_from(user).await {
            Ok(affected) => {
                self.sink.info("User messages removed successfully");
                TaskStatus::Completed { affected }
            }
            Err(e) => {
                self.sink.error("Error deleting messages:", &e.to_string());
                TaskStatus::Failed(e.to_string())
            }
        };
        TaskOutcome::new(CleanupTask::Messages, status)
    }

    async fn remove_from_conversations(&self, user: &RecordId) -> TaskOutcome {
        // The reconciler reports its own errors through the sink.
        let status = match self.reconciler.reconcile(user.as_str(), &self.options).await {
            Ok(summary) => TaskStatus::Completed {
                affected: summary.touched() as u64,
            },
            Err(e) => TaskStatus::Failed(e.to_string()),
        };
        TaskOutcome::new(CleanupTask::Conversations, status)
    }

    async fn remove_profile_picture(&self, picture: &RecordId) -> TaskOutcome {
        let status = match self.try_remove_profile_picture(picture).await {
            Ok(()) => {
                self.sink.info("User profile picture deleted successfully");
                TaskStatus::Completed { affected: 1 }
            }
            Err(e) => {
                self.sink
                    .error("Error deleting user profile picture:", &e.to_string());
                TaskStatus::Failed(e.to_string())
            }
        };
        TaskOutcome::new(CleanupTask::ProfilePicture, status)
    }

    async fn try_remove_profile_picture(&self, picture: &RecordId) -> Result<(), DomainError> {
        let media = self
            .stores
            .media
            .find_media(picture)
            .await?
            .ok_or_else(|| DomainError::Store(format!("media record {} not found", picture)))?;
        self.files
            .relocate_profile_picture(&media.uploaded_file_name)
            .await?;
        self.stores.media.delete_media(&media.id).await
    }
}
