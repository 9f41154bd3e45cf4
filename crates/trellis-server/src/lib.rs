//! Trellis Server - HTTP endpoint for the template index
//!
//! This crate exposes the index builder to the admin panel over a
//! single authenticated route:
//!
//! `GET <admin-base>/template-service/templates`
//!
//! Every request runs a fresh walk on a blocking thread; requests share
//! no mutable state.

mod auth;
mod protocol;
mod server;

pub use auth::{AccessDenied, AdminAuth};
pub use protocol::{templates_route, ErrorBody};
pub use server::{router, ServerConfig, ServerError, ServiceState, TrellisServer};
