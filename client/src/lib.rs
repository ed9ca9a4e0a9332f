//! Client core for the Shoepao chat backend.
//!
//! [`ChatStore`] keeps the conversation list, the open conversation and its
//! messages in step with the backend, talking to it through a
//! [`ChatGateway`]. [`HttpGateway`] is the production gateway.

pub mod api;
pub mod commands;
pub mod errors;
pub mod models;
pub mod state;
pub mod view;

#[cfg(test)]
mod testing;

pub use api::{ChatGateway, DEFAULT_API_BASE, HttpGateway};
pub use errors::{ApiError, ChatError};
pub use state::{ChatState, ChatStore};
