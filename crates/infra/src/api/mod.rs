//! Risma API client
//!
//! Everything that talks to the remote service goes through
//! [`RequestGateway`], which attaches the bearer credential and performs the
//! single-flight token refresh on 401.
//!
//! # Architecture
//!
//! - `gateway`: credential attachment, refresh, one resend
//! - `commands`: typed list and search job operations
//! - `auth`: login, logout and session restore

pub mod auth;
pub mod commands;
pub mod gateway;

pub use auth::AuthService;
pub use commands::ApiCommands;
pub use gateway::{GatewayRequest, GatewayResponse, RequestGateway};
