//! Tag API client methods

use super::{AdminClient, ClientError};
use crate::types::{LimitQuery, PageQuery};
use serde::de::IgnoredAny;
use wallpaper_core::{PageResult, Tag};

pub const DEFAULT_HOT_TAG_LIMIT: u32 = 10;

impl AdminClient {
    /// List tags page by page
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn tags(&self, query: &PageQuery) -> Result<PageResult<Tag>, ClientError> {
        self.get_with("/tag/page", query).await
    }

    /// Every tag, unpaginated
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn all_tags(&self) -> Result<Vec<Tag>, ClientError> {
        self.get("/tag/all").await
    }

    /// Most used tags, ten unless `limit` says otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn hot_tags(&self, limit: Option<u32>) -> Result<Vec<Tag>, ClientError> {
        let query = LimitQuery {
            limit: limit.unwrap_or(DEFAULT_HOT_TAG_LIMIT),
        };
        self.get_with("/tag/hot", &query).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn tag(&self, id: i64) -> Result<Tag, ClientError> {
        self.get(&format!("/tag/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn create_tag(&self, tag: &Tag) -> Result<(), ClientError> {
        let _: IgnoredAny = self.post("/tag", tag).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn update_tag(&self, tag: &Tag) -> Result<(), ClientError> {
        let _: IgnoredAny = self.put("/tag", tag).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn delete_tag(&self, id: i64) -> Result<(), ClientError> {
        let _: IgnoredAny = self.delete(&format!("/tag/{id}")).await?;
        Ok(())
    }
}
