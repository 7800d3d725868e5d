pub mod sqlite_store;
pub mod upload_dir;

pub use sqlite_store::SqliteStore;
pub use upload_dir::UploadDir;
