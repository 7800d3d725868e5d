//! Application use cases. Orchestrate domain logic via ports.

pub mod conversation_reconciler;
pub mod user_cleanup;

pub use conversation_reconciler::{ConversationReconciler, ReconcileSummary};
pub use user_cleanup::{
    CleanupReport, CleanupStores, CleanupTask, TaskOutcome, TaskStatus, UserCleanupService,
};
