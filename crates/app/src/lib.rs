//! Clarity Pixel embedded app library.
//!
//! The binary in `main.rs` wires these modules into a server; integration
//! tests and the CLI use them directly.
//!
//! # Security
//!
//! Holds the app's Shopify API secret and every installed shop's offline
//! access token. Tokens never leave the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
