#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use user_cleanup::adapters::logging::MemorySink;
use user_cleanup::adapters::persistence::{SqliteStore, UploadDir};
use user_cleanup::domain::{Conversation, Media, RecordId, User};
use user_cleanup::ports::ConversationStore;

/// A store, an uploads root and a recording sink inside one temp directory.
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub uploads: Arc<UploadDir>,
    pub sink: Arc<MemorySink>,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::connect(dir.path().join("data")).await.unwrap());
        let uploads_root = dir.path().join("uploads");
        std::fs::create_dir_all(uploads_root.join("rescaled")).unwrap();
        std::fs::create_dir_all(uploads_root.join("profilepics")).unwrap();
        Self {
            dir,
            store,
            uploads: Arc::new(UploadDir::new(uploads_root)),
            sink: Arc::new(MemorySink::new()),
        }
    }

    pub async fn user(&self, picture: Option<RecordId>) -> User {
        let user = User {
            id: RecordId::new(),
            name: "departing".to_string(),
            picture,
        };
        self.store.insert_user(&user).await.unwrap();
        user
    }

    pub async fn conversation(&self, members: &[&RecordId], creator: &RecordId) -> Conversation {
        let conversation = Conversation {
            id: RecordId::new(),
            members: members.iter().map(|&m| m.clone()).collect(),
            creator: creator.clone(),
            group_name: "Test Group".to_string(),
        };
        self.store.save_conversation(&conversation).await.unwrap();
        conversation
    }

    /// Media record plus its original and rescaled files on disk.
    pub async fn upload(&self, owner: &RecordId, name: &str) -> Media {
        let root = self.uploads.root();
        std::fs::write(root.join(name), b"original").unwrap();
        std::fs::write(root.join("rescaled").join(format!("rescaled_{}", name)), b"rescaled")
            .unwrap();
        let media = Media {
            id: RecordId::new(),
            owner: owner.clone(),
            uploaded_file_name: name.to_string(),
        };
        self.store.insert_media(&media).await.unwrap();
        media
    }

    /// Profile pictures live in `profilepics/` and are not listed among `owner`'s uploads
    /// unless `owner` is the departing user.
    pub async fn profile_picture(&self, owner: &RecordId, name: &str) -> Media {
        std::fs::write(self.uploads.root().join("profilepics").join(name), b"face").unwrap();
        let media = Media {
            id: RecordId::new(),
            owner: owner.clone(),
            uploaded_file_name: name.to_string(),
        };
        self.store.insert_media(&media).await.unwrap();
        media
    }
}
