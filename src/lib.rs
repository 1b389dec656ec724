//! Service and controller layer of a cluster administration console.
//!
//! Talks to the cluster's REST backend for authentication, XDCR
//! configuration, pricing settings, and statistics polling. The UI
//! framework on top binds to the watch/broadcast channels exposed here;
//! everything is wired through [`console::Console`] with explicit
//! constructors.

pub mod auth;
pub mod config;
pub mod console;
pub mod controllers;
pub mod http;
pub mod pricing;
pub mod stats;
pub mod stream;
pub mod xdcr;

pub use auth::AuthService;
pub use config::ConsoleConfig;
pub use console::Console;
pub use pricing::PricingService;
pub use stats::{StatsPoller, Zoom};
pub use xdcr::XdcrService;
