//! Request and response bodies for the wallpaper catalog API

use crate::client::request::FilePart;
use serde::{Deserialize, Serialize};
use wallpaper_core::{Credential, UserInfo};

/// Credentials for `POST /user/login` and `POST /user/register`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Data returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_info: UserInfo,
}

impl LoginResult {
    pub fn credential(&self) -> Credential {
        Credential::new(self.token.clone(), self.refresh_token.clone())
    }
}

/// Body of `POST /user/refresh-token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Data returned by a successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl From<TokenPair> for Credential {
    fn from(pair: TokenPair) -> Self {
        Self::new(pair.token, pair.refresh_token)
    }
}

/// Pagination parameters shared by the `/page` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            keyword: None,
        }
    }
}

/// Filters for `GET /wallpaper/page`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitQuery {
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenQuery {
    pub parent_id: i64,
}

/// Image file plus the wallpaper fields sent with `POST /wallpaper/upload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperUpload {
    pub file: FilePart,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub tag_ids: Vec<i64>,
}

impl WallpaperUpload {
    /// Upload of `bytes` sent under the form field `file`
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file: FilePart::new("file", file_name, bytes),
            title: None,
            description: None,
            category_id: None,
            tag_ids: Vec::new(),
        }
    }
}
