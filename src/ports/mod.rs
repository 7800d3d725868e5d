//! Port traits. API boundaries for the hexagon.
//!
//! - Outbound: Called by application into infrastructure (stores, files)
//! - Sink: Called by application to report progress

pub mod outbound;
pub mod sink;

pub use outbound::{
    ConversationStore, FriendshipStore, MediaFiles, MediaStore, MessageStore, UserStore,
};
pub use sink::CleanupSink;
