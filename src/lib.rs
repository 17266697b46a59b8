//! Workdeck: the state core of a single-workspace task manager.
//!
//! The crate is organized around a reconciliation [`engine`](crate::engine)
//! that mirrors every persisted collection in memory, routes all mutations
//! through a pull-merge-write cycle against a [`store`](crate::store), and
//! keeps the mirror converged with a background poll. Presentation layers sit
//! on top of [`engine::Engine`] and never touch storage directly.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod format;
pub mod notify;
pub mod session;
pub mod store;
pub mod types;
