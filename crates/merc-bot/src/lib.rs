//! Mercantile pricelist bot application.
//!
//! Wires the pricelist engine to its collaborators: the HTTP pricer
//! client, the live price feed and the file-backed item schema.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod schema;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
