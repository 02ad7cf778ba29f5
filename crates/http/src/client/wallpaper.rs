//! Wallpaper API client methods

use super::request::{ApiRequest, MultipartBody};
use super::{AdminClient, ClientError};
use crate::types::{LimitQuery, WallpaperQuery, WallpaperUpload};
use serde::de::IgnoredAny;
use tracing::info;
use wallpaper_core::{PageResult, Wallpaper};

pub const UPLOAD_PATH: &str = "/wallpaper/upload";
pub const DEFAULT_LATEST_LIMIT: u32 = 5;
pub const DEFAULT_HOT_LIMIT: u32 = 5;

impl AdminClient {
    /// List wallpapers page by page
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn wallpapers(
        &self,
        query: &WallpaperQuery,
    ) -> Result<PageResult<Wallpaper>, ClientError> {
        self.get_with("/wallpaper/page", query).await
    }

    /// Get a wallpaper by id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn wallpaper(&self, id: i64) -> Result<Wallpaper, ClientError> {
        self.get(&format!("/wallpaper/{id}")).await
    }

    /// Create a wallpaper uploaded by the logged-in user
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn create_wallpaper(&self, mut wallpaper: Wallpaper) -> Result<(), ClientError> {
        if wallpaper.upload_user_id.is_none() {
            wallpaper.upload_user_id = self.store().user_info()?.map(|user| user.id);
        }
        let _: IgnoredAny = self.post("/wallpaper", &wallpaper).await?;
        Ok(())
    }

    /// Upload an image file and create its wallpaper in one call
    ///
    /// The uploader is the stored user; the field is left out when nobody
    /// is logged in and the backend decides.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn upload_wallpaper_image(
        &self,
        upload: WallpaperUpload,
    ) -> Result<Wallpaper, ClientError> {
        let WallpaperUpload {
            file,
            title,
            description,
            category_id,
            tag_ids,
        } = upload;
        let file_name = file.file_name.clone();

        let mut form = MultipartBody::new(file);
        if let Some(user) = self.store().user_info()? {
            form = form.text("uploadUserId", user.id);
        }
        if let Some(title) = title {
            form = form.text("title", title);
        }
        if let Some(description) = description {
            form = form.text("description", description);
        }
        if let Some(category_id) = category_id {
            form = form.text("categoryId", category_id);
        }
        for tag_id in tag_ids {
            form = form.text("tagIds", tag_id);
        }

        let wallpaper: Wallpaper = self
            .execute(ApiRequest::post(UPLOAD_PATH).multipart(form))
            .await?;
        info!(file = %file_name, id = ?wallpaper.id, "wallpaper uploaded");
        Ok(wallpaper)
    }

    /// Update a wallpaper
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn update_wallpaper(&self, wallpaper: &Wallpaper) -> Result<(), ClientError> {
        let _: IgnoredAny = self.put("/wallpaper", wallpaper).await?;
        Ok(())
    }

    /// Delete a wallpaper
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn delete_wallpaper(&self, id: i64) -> Result<(), ClientError> {
        let _: IgnoredAny = self.delete(&format!("/wallpaper/{id}")).await?;
        Ok(())
    }

    /// Most recently added wallpapers, five unless `limit` says otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn latest_wallpapers(&self, limit: Option<u32>) -> Result<Vec<Wallpaper>, ClientError> {
        let query = LimitQuery {
            limit: limit.unwrap_or(DEFAULT_LATEST_LIMIT),
        };
        self.get_with("/wallpaper/latest", &query).await
    }

    /// Most downloaded wallpapers, five unless `limit` says otherwise
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn hot_wallpapers(&self, limit: Option<u32>) -> Result<Vec<Wallpaper>, ClientError> {
        let query = LimitQuery {
            limit: limit.unwrap_or(DEFAULT_HOT_LIMIT),
        };
        self.get_with("/wallpaper/hot", &query).await
    }
}
