//! Imageforge - AI image studio with a persistent gallery
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod controller;
pub mod server;
pub mod service;
