//! # SubClock Gateway
//!
//! HTTP API in front of the scheduler:
//! - `POST /v1/register` — subscribe a callback URL at a frequency
//! - `PUT /v1/register` — change the frequency of an existing subscription
//! - `POST /v1/deregister` — stop calling a callback URL
//! - `GET /v1/subscriptions` — list live subscriptions

pub mod routes;
pub mod server;
pub mod validation;

pub use server::{AppState, build_router, start};
pub use validation::{ApiError, ErrorCode};
