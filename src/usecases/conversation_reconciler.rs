//! Removes a departing user from every group conversation they belong to or own.
//!
//! - One OR query (member or creator) fetches the affected conversations
//! - Each one is repaired with `repair_conversation`, then saved or deleted
//! - The first store error aborts the pass; earlier writes are kept

use crate::domain::{
    DomainError, ReconcileOptions, RecordId, Repair, random_index, repair_conversation,
};
use crate::ports::{CleanupSink, ConversationStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts for one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub deleted: usize,
}

impl ReconcileSummary {
    pub fn touched(&self) -> usize {
        self.updated + self.deleted
    }
}

pub struct ConversationReconciler {
    conversations: Arc<dyn ConversationStore>,
    sink: Arc<dyn CleanupSink>,
}

impl ConversationReconciler {
    pub fn new(conversations: Arc<dyn ConversationStore>, sink: Arc<dyn CleanupSink>) -> Self {
        Self {
            conversations,
            sink,
        }
    }

    /// Reconcile all conversations referencing `user_id`.
    ///
    /// Failures (malformed id, store errors) are reported once through the sink before
    /// being returned; callers are free to ignore the `Err`.
    pub async fn reconcile(
        &self,
        user_id: &str,
        options: &ReconcileOptions,
    ) -> Result<ReconcileSummary, DomainError> {
        match self.run(user_id, options).await {
            Ok(summary) => {
                self.sink.info("User removed from conversations successfully");
                info!(
                    user_id,
                    updated = summary.updated,
                    deleted = summary.deleted,
                    "conversations reconciled"
                );
                Ok(summary)
            }
            Err(e) => {
                self.sink
                    .error("Error removing user from conversations:", &e.to_string());
                warn!(user_id, error = %e, "conversation reconciliation aborted");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        user_id: &str,
        options: &ReconcileOptions,
    ) -> Result<ReconcileSummary, DomainError> {
        let user = RecordId::parse(user_id)?;
        let conversations = self.conversations.find_conversations_of(&user).await?;
        debug!(user_id = %user, count = conversations.len(), "conversations to reconcile");

        let mut summary = ReconcileSummary::default();
        for conversation in conversations {
            match repair_conversation(conversation, &user, options, random_index) {
                Repair::Save(updated) => {
                    self.conversations.save_conversation(&updated).await?;
                    self.sink.info(&format!("Updated conversation {}", updated.id));
                    summary.updated += 1;
                }
                Repair::Delete { id, reason } => {
                    self.conversations.delete_conversation(&id).await?;
                    self.sink.info(&format!(
                        "Conversation {} removed because no members left",
                        id
                    ));
                    debug!(conversation_id = %id, ?reason, "conversation deleted");
                    summary.deleted += 1;
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::logging::MemorySink;
    use crate::domain::{Conversation, CreatorSelection};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Conversation store backed by a Vec, with optional failure of the query or the n-th write.
    #[derive(Default)]
    struct FakeConversations {
        rows: Mutex<Vec<Conversation>>,
        queries: AtomicUsize,
        writes: AtomicUsize,
        fail_on_query: bool,
        fail_on_write: Option<usize>,
    }

    impl FakeConversations {
        fn with(rows: Vec<Conversation>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }

        fn get(&self, id: &RecordId) -> Option<Conversation> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|c| &c.id == id)
                .cloned()
        }

        fn bump_write(&self) -> Result<(), DomainError> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_write == Some(n) {
                return Err(DomainError::Store("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ConversationStore for FakeConversations {
        async fn find_conversations_of(
            &self,
            user: &RecordId,
        ) -> Result<Vec<Conversation>, DomainError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_query {
                return Err(DomainError::Store("query timed out".to_string()));
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.has_member(user) || &c.creator == user)
                .cloned()
                .collect())
        }

        async fn save_conversation(&self, conversation: &Conversation) -> Result<(), DomainError> {
            self.bump_write()?;
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|c| c.id == conversation.id) {
                *row = conversation.clone();
            } else {
                rows.push(conversation.clone());
            }
            Ok(())
        }

        async fn delete_conversation(&self, id: &RecordId) -> Result<(), DomainError> {
            self.bump_write()?;
            self.rows.lock().unwrap().retain(|c| &c.id != id);
            Ok(())
        }
    }

    fn conv(members: &[&RecordId], creator: &RecordId) -> Conversation {
        Conversation {
            id: RecordId::new(),
            members: members.iter().map(|&m| m.clone()).collect(),
            creator: creator.clone(),
            group_name: "Test Group".to_string(),
        }
    }

    fn setup(
        rows: Vec<Conversation>,
    ) -> (Arc<FakeConversations>, Arc<MemorySink>, ConversationReconciler) {
        let store = Arc::new(FakeConversations::with(rows));
        let sink = Arc::new(MemorySink::new());
        let reconciler = ConversationReconciler::new(store.clone(), sink.clone());
        (store, sink, reconciler)
    }

    #[tokio::test]
    async fn test_member_removed_and_update_logged() {
        let (a, b) = (RecordId::new(), RecordId::new());
        let c = conv(&[&a, &b], &b);
        let (store, sink, reconciler) = setup(vec![c.clone()]);

        let summary = reconciler
            .reconcile(a.as_str(), &ReconcileOptions::default())
            .await
            .unwrap();

        let updated = store.get(&c.id).unwrap();
        assert_eq!(updated.members, vec![b.clone()]);
        assert_eq!(updated.creator, b);
        assert_eq!(summary, ReconcileSummary { updated: 1, deleted: 0 });
        assert!(sink.has_info(&format!("Updated conversation {}", c.id)));
    }

    #[tokio::test]
    async fn test_user_removed_from_every_conversation() {
        let (u, o1, o2) = (RecordId::new(), RecordId::new(), RecordId::new());
        let rows = vec![
            conv(&[&u, &o1], &o1),
            conv(&[&u, &o2], &u),
            conv(&[&u, &o1, &o2], &o2),
        ];
        let ids: Vec<RecordId> = rows.iter().map(|c| c.id.clone()).collect();
        let (store, _sink, reconciler) = setup(rows);

        reconciler
            .reconcile(u.as_str(), &ReconcileOptions::default())
            .await
            .unwrap();

        for id in &ids {
            let c = store.get(id).unwrap();
            assert!(!c.has_member(&u));
            assert_ne!(c.creator, u);
        }
    }

    #[tokio::test]
    async fn test_first_selection_promotes_first_remaining() {
        let (a, b, c) = (RecordId::new(), RecordId::new(), RecordId::new());
        let row = conv(&[&a, &b, &c], &a);
        let (store, _sink, reconciler) = setup(vec![row.clone()]);
        let options = ReconcileOptions {
            new_creator_selection: CreatorSelection::First,
            ..Default::default()
        };

        reconciler.reconcile(a.as_str(), &options).await.unwrap();

        assert_eq!(store.get(&row.id).unwrap().creator, b);
    }

    #[tokio::test]
    async fn test_random_selection_reaches_every_remaining_member() {
        let (a, b, c) = (RecordId::new(), RecordId::new(), RecordId::new());
        let mut seen_b = false;
        let mut seen_c = false;
        for _ in 0..200 {
            let row = conv(&[&a, &b, &c], &a);
            let (store, _sink, reconciler) = setup(vec![row.clone()]);
            reconciler
                .reconcile(a.as_str(), &ReconcileOptions::default())
                .await
                .unwrap();
            let creator = store.get(&row.id).unwrap().creator;
            assert!(creator == b || creator == c);
            seen_b |= creator == b;
            seen_c |= creator == c;
        }
        assert!(seen_b && seen_c);
    }

    #[tokio::test]
    async fn test_sole_member_creator_deleted_even_when_keeping_empty() {
        let a = RecordId::new();
        let row = conv(&[&a], &a);
        let (store, sink, reconciler) = setup(vec![row.clone()]);
        let options = ReconcileOptions {
            remove_empty_conversations: false,
            ..Default::default()
        };

        let summary = reconciler.reconcile(a.as_str(), &options).await.unwrap();

        assert!(store.get(&row.id).is_none());
        assert_eq!(summary.deleted, 1);
        assert!(sink.has_info(&format!(
            "Conversation {} removed because no members left",
            row.id
        )));
    }

    #[tokio::test]
    async fn test_empty_conversation_with_other_creator_is_archived() {
        let (a, x) = (RecordId::new(), RecordId::new());
        let row = conv(&[&a], &x);
        let (store, _sink, reconciler) = setup(vec![row.clone()]);
        let options = ReconcileOptions {
            remove_empty_conversations: false,
            ..Default::default()
        };

        reconciler.reconcile(a.as_str(), &options).await.unwrap();

        let kept = store.get(&row.id).unwrap();
        assert!(kept.members.is_empty());
        assert_eq!(kept.creator, x);
    }

    #[tokio::test]
    async fn test_no_matches_logs_only_success() {
        let (a, b) = (RecordId::new(), RecordId::new());
        let (_store, sink, reconciler) = setup(vec![conv(&[&b], &b)]);

        let summary = reconciler
            .reconcile(a.as_str(), &ReconcileOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.touched(), 0);
        assert_eq!(
            sink.infos(),
            vec!["User removed from conversations successfully".to_string()]
        );
        assert!(sink.errors().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_reports_error_without_store_access() {
        let b = RecordId::new();
        let (store, sink, reconciler) = setup(vec![conv(&[&b], &b)]);

        let result = reconciler
            .reconcile("invalid-id", &ReconcileOptions::default())
            .await;

        assert!(matches!(result, Err(DomainError::InvalidId(_))));
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].0.contains("Error removing user from conversations"));
        assert_eq!(store.queries.load(Ordering::SeqCst), 0);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(sink.infos().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_remaining_and_keeps_earlier_writes() {
        let (a, b) = (RecordId::new(), RecordId::new());
        let first = conv(&[&a, &b], &b);
        let second = conv(&[&a, &b], &b);
        let third = conv(&[&a, &b], &b);
        let store = Arc::new(FakeConversations {
            fail_on_write: Some(1),
            ..FakeConversations::with(vec![first.clone(), second.clone(), third.clone()])
        });
        let sink = Arc::new(MemorySink::new());
        let reconciler = ConversationReconciler::new(store.clone(), sink.clone());

        let result = reconciler
            .reconcile(a.as_str(), &ReconcileOptions::default())
            .await;

        assert!(matches!(result, Err(DomainError::Store(_))));
        assert!(!store.get(&first.id).unwrap().has_member(&a));
        assert!(store.get(&second.id).unwrap().has_member(&a));
        assert!(store.get(&third.id).unwrap().has_member(&a));
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        assert_eq!(sink.errors().len(), 1);
        assert!(!sink.has_info("User removed from conversations successfully"));
    }

    #[tokio::test]
    async fn test_query_failure_reports_once_and_writes_nothing() {
        let a = RecordId::new();
        let row = conv(&[&a], &a);
        let store = Arc::new(FakeConversations {
            fail_on_query: true,
            ..FakeConversations::with(vec![row.clone()])
        });
        let sink = Arc::new(MemorySink::new());
        let reconciler = ConversationReconciler::new(store.clone(), sink.clone());

        let result = reconciler
            .reconcile(a.as_str(), &ReconcileOptions::default())
            .await;

        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(&row.id), Some(row));
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "Error removing user from conversations:");
        assert!(sink.infos().is_empty());
    }
}
