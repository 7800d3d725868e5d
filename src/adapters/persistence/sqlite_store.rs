//! SQLite-backed document store via libsql. Implements every collection port.
//!
//! One database file (store.db) holds the users, friendships, media, messages and
//! conversations collections. Conversation members are kept as an ordered JSON array;
//! membership queries go through `json_each`.

use crate::domain::{Conversation, DomainError, Friendship, Media, Message, RecordId, User};
use crate::ports::{ConversationStore, FriendshipStore, MediaStore, MessageStore, UserStore};
use libsql::{Connection, Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    picture TEXT
)"#;

const FRIENDSHIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS friendships (
    id TEXT PRIMARY KEY,
    person1 TEXT NOT NULL,
    person2 TEXT NOT NULL
)"#;

const MEDIA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    owner TEXT NOT NULL,
    uploaded_file_name TEXT NOT NULL
)"#;
const MEDIA_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_media_owner ON media (owner)";

const MESSAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    sender TEXT NOT NULL,
    conversation TEXT NOT NULL,
    text TEXT NOT NULL DEFAULT ''
)"#;
const MESSAGES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages (sender)";

/// `creator` is NOT NULL: a stored conversation always has an owner.
const CONVERSATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    group_name TEXT NOT NULL DEFAULT '',
    creator TEXT NOT NULL,
    members TEXT NOT NULL DEFAULT '[]'
)"#;

const SELECT_CONVERSATION: &str = "SELECT id, group_name, creator, members FROM conversations";

fn store_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Store(e.to_string())
}

/// SQLite document store. Safe to share via Arc.
pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) `store.db` in `base_dir` and ensure the schema exists.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(store_err)?;
        let db_path = base.join("store.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(store_err)?;
        let conn = db.connect().map_err(store_err)?;

        // PRAGMA returns a row; drain it (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows.next().await.map_err(store_err)?.is_some() {}

        for ddl in [
            USERS_TABLE,
            FRIENDSHIPS_TABLE,
            MEDIA_TABLE,
            MEDIA_INDEX,
            MESSAGES_TABLE,
            MESSAGES_INDEX,
            CONVERSATIONS_TABLE,
        ] {
            conn.execute(ddl, ()).await.map_err(store_err)?;
        }

        info!(path = %db_path.display(), "document store connected");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        self.db.connect().map_err(store_err)
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), DomainError> {
        let picture = user.picture.as_ref().map(|p| p.to_string());
        self.conn()?
            .execute(
                "INSERT INTO users (id, name, picture) VALUES (?1, ?2, ?3)",
                params![user.id.as_str(), user.name.as_str(), picture],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn insert_friendship(&self, friendship: &Friendship) -> Result<(), DomainError> {
        self.conn()?
            .execute(
                "INSERT INTO friendships (id, person1, person2) VALUES (?1, ?2, ?3)",
                params![
                    friendship.id.as_str(),
                    friendship.person1.as_str(),
                    friendship.person2.as_str()
                ],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn insert_media(&self, media: &Media) -> Result<(), DomainError> {
        self.conn()?
            .execute(
                "INSERT INTO media (id, owner, uploaded_file_name) VALUES (?1, ?2, ?3)",
                params![
                    media.id.as_str(),
                    media.owner.as_str(),
                    media.uploaded_file_name.as_str()
                ],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn insert_message(&self, message: &Message) -> Result<(), DomainError> {
        self.conn()?
            .execute(
                "INSERT INTO messages (id, sender, conversation, text) VALUES (?1, ?2, ?3, ?4)",
                params![
                    message.id.as_str(),
                    message.sender.as_str(),
                    message.conversation.as_str(),
                    message.text.as_str()
                ],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn find_conversation(
        &self,
        id: &RecordId,
    ) -> Result<Option<Conversation>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                &format!("{} WHERE id = ?1", SELECT_CONVERSATION),
                params![id.as_str()],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_conversation(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn count_friendships_of(&self, user: &RecordId) -> Result<u64, DomainError> {
        self.count(
            "SELECT COUNT(*) FROM friendships WHERE person1 = ?1 OR person2 = ?1",
            user,
        )
        .await
    }

    pub async fn count_messages_from(&self, sender: &RecordId) -> Result<u64, DomainError> {
        self.count("SELECT COUNT(*) FROM messages WHERE sender = ?1", sender)
            .await
    }

    async fn count(&self, sql: &str, id: &RecordId) -> Result<u64, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params![id.as_str()])
            .await
            .map_err(store_err)?;
        let n: i64 = match rows.next().await.map_err(store_err)? {
            Some(row) => row.get(0).map_err(store_err)?,
            None => 0,
        };
        Ok(n as u64)
    }

    fn parse_id(row: &Row, idx: i32) -> Result<RecordId, DomainError> {
        let raw: String = row.get(idx).map_err(store_err)?;
        RecordId::parse(&raw)
    }

    fn row_to_conversation(row: &Row) -> Result<Conversation, DomainError> {
        let members_json: String = row.get(3).map_err(store_err)?;
        let members: Vec<RecordId> = serde_json::from_str(&members_json)
            .map_err(|e| DomainError::Store(format!("corrupt members array: {}", e)))?;
        Ok(Conversation {
            id: Self::parse_id(row, 0)?,
            group_name: row.get::<String>(1).unwrap_or_default(),
            creator: Self::parse_id(row, 2)?,
            members,
        })
    }

    fn row_to_media(row: &Row) -> Result<Media, DomainError> {
        Ok(Media {
            id: Self::parse_id(row, 0)?,
            owner: Self::parse_id(row, 1)?,
            uploaded_file_name: row.get(2).map_err(store_err)?,
        })
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteStore {
    async fn find_user(&self, id: &RecordId) -> Result<Option<User>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, name, picture FROM users WHERE id = ?1",
                params![id.as_str()],
            )
            .await
            .map_err(store_err)?;
        let Some(row) = rows.next().await.map_err(store_err)? else {
            return Ok(None);
        };
        let picture: Option<String> = row.get(2).map_err(store_err)?;
        Ok(Some(User {
            id: Self::parse_id(&row, 0)?,
            name: row.get(1).map_err(store_err)?,
            picture: picture.map(|p| RecordId::parse(&p)).transpose()?,
        }))
    }
}

#[async_trait::async_trait]
impl FriendshipStore for SqliteStore {
    async fn delete_friendships_of(&self, user: &RecordId) -> Result<u64, DomainError> {
        let n = self
            .conn()?
            .execute(
                "DELETE FROM friendships WHERE person1 = ?1 OR person2 = ?1",
                params![user.as_str()],
            )
            .await
            .map_err(store_err)?;
        debug!(user_id = %user, count = n, "friendships deleted");
        Ok(n)
    }
}

#[async_trait::async_trait]
impl MediaStore for SqliteStore {
    async fn find_media_by_owner(&self, owner: &RecordId) -> Result<Vec<Media>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, owner, uploaded_file_name FROM media WHERE owner = ?1 ORDER BY rowid",
                params![owner.as_str()],
            )
            .await
            .map_err(store_err)?;
        let mut media = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            media.push(Self::row_to_media(&row)?);
        }
        Ok(media)
    }

    async fn find_media(&self, id: &RecordId) -> Result<Option<Media>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT id, owner, uploaded_file_name FROM media WHERE id = ?1",
                params![id.as_str()],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(Self::row_to_media(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_media(&self, id: &RecordId) -> Result<(), DomainError> {
        self.conn()?
            .execute("DELETE FROM media WHERE id = ?1", params![id.as_str()])
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageStore for SqliteStore {
    async fn delete_messages_from(&self, sender: &RecordId) -> Result<u64, DomainError> {
        let n = self
            .conn()?
            .execute(
                "DELETE FROM messages WHERE sender = ?1",
                params![sender.as_str()],
            )
            .await
            .map_err(store_err)?;
        debug!(user_id = %sender, count = n, "messages deleted");
        Ok(n)
    }
}

#[async_trait::async_trait]
impl ConversationStore for SqliteStore {
    async fn find_conversations_of(
        &self,
        user: &RecordId,
    ) -> Result<Vec<Conversation>, DomainError> {
        let sql = format!(
            "{} WHERE creator = ?1 \
             OR EXISTS (SELECT 1 FROM json_each(conversations.members) WHERE json_each.value = ?1) \
             ORDER BY rowid",
            SELECT_CONVERSATION
        );
        let conn = self.conn()?;
        let mut rows = conn
            .query(&sql, params![user.as_str()])
            .await
            .map_err(store_err)?;
        let mut conversations = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            conversations.push(Self::row_to_conversation(&row)?);
        }
        Ok(conversations)
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), DomainError> {
        let members = serde_json::to_string(&conversation.members).map_err(store_err)?;
        self.conn()?
            .execute(
                r#"
                INSERT INTO conversations (id, group_name, creator, members)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (id) DO UPDATE SET
                    group_name = excluded.group_name,
                    creator = excluded.creator,
                    members = excluded.members
                "#,
                params![
                    conversation.id.as_str(),
                    conversation.group_name.as_str(),
                    conversation.creator.as_str(),
                    members
                ],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete_conversation(&self, id: &RecordId) -> Result<(), DomainError> {
        self.conn()?
            .execute(
                "DELETE FROM conversations WHERE id = ?1",
                params![id.as_str()],
            )
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
