//! Quiz Flow: a branching quiz engine with scored outcomes, lead capture and webhooks.

pub mod config;
pub mod error;
pub mod loader;
pub mod mount;
pub mod quiz;
pub mod session;
pub mod signals;
pub mod terminal;
pub mod webhook;
