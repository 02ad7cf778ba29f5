//! Wallpaper catalog HTTP client
//!
//! The [`client`] module holds the authenticated request pipeline: a
//! transport that injects the stored bearer credential, a response
//! interceptor that classifies every envelope, and an [`AuthCoordinator`]
//! that refreshes an expired credential once per burst of failures and
//! replays the requests queued behind it.
//!
//! [`AuthCoordinator`]: client::coordinator::AuthCoordinator

pub mod client;
pub mod types;

pub use client::{AdminClient, AdminClientBuilder, config::ClientConfig, error::ClientError};
