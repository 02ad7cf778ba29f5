//! Category API client methods

use super::{AdminClient, ClientError};
use crate::types::{ChildrenQuery, PageQuery};
use serde::de::IgnoredAny;
use wallpaper_core::{Category, PageResult};

impl AdminClient {
    /// List categories page by page
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn categories(&self, query: &PageQuery) -> Result<PageResult<Category>, ClientError> {
        self.get_with("/category/page", query).await
    }

    /// Full category tree
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn category_tree(&self) -> Result<Vec<Category>, ClientError> {
        self.get("/category/tree").await
    }

    /// Direct children of `parent_id`; top-level categories for `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn category_children(
        &self,
        parent_id: Option<i64>,
    ) -> Result<Vec<Category>, ClientError> {
        let query = ChildrenQuery {
            parent_id: parent_id.unwrap_or(0),
        };
        self.get_with("/category/children", &query).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn category(&self, id: i64) -> Result<Category, ClientError> {
        self.get(&format!("/category/{id}")).await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn create_category(&self, category: &Category) -> Result<(), ClientError> {
        let _: IgnoredAny = self.post("/category", category).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn update_category(&self, category: &Category) -> Result<(), ClientError> {
        let _: IgnoredAny = self.put("/category", category).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn delete_category(&self, id: i64) -> Result<(), ClientError> {
        let _: IgnoredAny = self.delete(&format!("/category/{id}")).await?;
        Ok(())
    }
}
