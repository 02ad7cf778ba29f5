//! Wallpaper admin core types and utilities

pub mod error;
pub mod storage;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use storage::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
pub use types::{
    Category, Credential, Envelope, PageResult, SUCCESS_CODE, Tag, UNAUTHORIZED_CODE, UserInfo,
    Wallpaper,
};
