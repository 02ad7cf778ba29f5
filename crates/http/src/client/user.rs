//! User and session API client methods

use super::request::ApiRequest;
use super::{AdminClient, ClientError};
use crate::types::{LoginRequest, LoginResult};
use serde::de::IgnoredAny;
use tracing::{info, warn};
use wallpaper_core::{Envelope, UserInfo};

pub const LOGIN_PATH: &str = "/user/login";
pub const REGISTER_PATH: &str = "/user/register";
pub const USER_INFO_PATH: &str = "/user/info";
pub const LOGOUT_PATH: &str = "/user/logout";
pub const REFRESH_TOKEN_PATH: &str = "/user/refresh-token";

impl AdminClient {
    /// Log in and store the returned credential and user
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the login or the credential
    /// cannot be stored
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResult, ClientError> {
        let result: LoginResult = self.post(LOGIN_PATH, request).await?;

        self.store().save(&result.credential())?;
        self.store().save_user_info(&result.user_info)?;
        info!(username = %result.user_info.username, "logged in");
        Ok(result)
    }

    /// Create a new account
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration
    pub async fn register(&self, request: &LoginRequest) -> Result<(), ClientError> {
        let _: IgnoredAny = self.post(REGISTER_PATH, request).await?;
        Ok(())
    }

    /// Fetch the logged-in user and refresh the stored copy
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails
    pub async fn current_user(&self) -> Result<UserInfo, ClientError> {
        let user: UserInfo = self.get(USER_INFO_PATH).await?;
        self.store().save_user_info(&user)?;
        Ok(user)
    }

    /// Log out
    ///
    /// Stored credentials are cleared and the user is sent to the login page
    /// whatever the backend answers. The backend's answer is returned
    /// untouched and never notified.
    ///
    /// # Errors
    ///
    /// Returns the logout call's own failure
    pub async fn logout(&self) -> Result<Envelope, ClientError> {
        let outcome = self.send(ApiRequest::post(LOGOUT_PATH)).await;

        if let Err(error) = self.store().clear() {
            warn!(%error, "failed to clear stored credentials");
        }
        self.session().leave_to_login();
        info!("logged out");
        outcome
    }
}
