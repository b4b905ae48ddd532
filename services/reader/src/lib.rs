//! services/reader/src/lib.rs
//!
//! The Clearread reader client: session tracking, route guarding, the document
//! access gate and the screens built on them.

pub mod access;
pub mod adapters;
pub mod command;
pub mod config;
pub mod error;
pub mod render;
pub mod screens;
pub mod session;
pub mod shell;
pub mod state;
