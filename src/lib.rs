//! ESPN dark mode - heuristic recoloring for a site with no dark theme
//!
//! Two layers work together on every page:
//! - a baseline stylesheet injected at document start ([`injector`])
//! - an adaptive scanner that reads each element's resolved colors and
//!   writes `!important` inline overrides, re-running on a back-off
//!   schedule, on DOM mutations and on client-side navigation ([`scanner`])
//!
//! [`controller::DarkMode`] ties both to the enabled flag. The page itself
//! is reached through the [`host`] traits: `web` binds them to the browser
//! (feature `wasm`), [`sim`] to an in-memory page used by the tests and the
//! `espn-dark-cli` replay tool (feature `cli`).

pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod host;
pub mod injector;
pub mod scanner;
pub mod sim;
pub mod theme;
pub mod time;
pub mod toggle;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web;

pub use config::ScanSchedule;
pub use controller::DarkMode;
pub use host::{Dom, EventLoop, Host, Mutation, TimerId, Wakeup};
