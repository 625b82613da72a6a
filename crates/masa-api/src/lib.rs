//! HTTP service for the Masa Madre customer-support chatbot.

pub mod config;
pub mod difficulty;
pub mod docs;
pub mod error;
pub mod middleware;
pub mod notifier;
pub mod pipeline;
pub mod router;
pub mod routes;
pub mod state;

pub use router::build_router;
