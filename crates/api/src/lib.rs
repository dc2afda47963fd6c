//! Bidboard REST API client.
//!
//! Wraps the marketplace backend: `{ success, message?, ...data }` envelopes,
//! a session cookie plus optional bearer token, and one method per endpoint.
//! Workflows depend on the [`MarketplaceApi`] trait; [`RestClient`] is the
//! `reqwest` implementation and also carries the admin endpoints.

#![warn(missing_docs)]

pub mod admin;
pub mod api;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use api::{LoginOutcome, MarketplaceApi, ProgressOutcome, VerificationRequest};
pub use client::{endpoint, RestClient};
pub use config::{ApiConfig, DEFAULT_BASE_URL};
pub use envelope::{decode_response, Envelope};
pub use error::{ApiError, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockApi;
