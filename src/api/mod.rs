//! API module
//!
//! HTTP server, routing, handlers, middleware, and request/response models.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
