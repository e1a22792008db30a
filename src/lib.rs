//! A blocking client for the keyvalue.xyz hosted key-value service
//!
//! The service hands out slots addressed by an opaque token plus a key
//! name. This crate creates slots, writes and reads their values, stores
//! serde types as JSON, and can verify a write by reading it straight back.
//!
//! # Features
//! - Blocking API, one or two requests per call
//! - HTTPS via rustls with webpki roots
//! - Object storage for any `serde::Serialize` type
//! - Read-back validation with exact or caller-defined comparison
//! - Pluggable [`Transport`] for tests or custom stacks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use keyvalue_client::Client;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! fn main() -> Result<(), keyvalue_client::Error> {
//!     let client = Client::default_service()?;
//!
//!     // Allocate a slot
//!     let mut kv = client.create("my-key")?;
//!     println!("token: {}", kv.token());
//!
//!     // Store and read a value
//!     kv.set_and_validate("Hello, World!")?;
//!     println!("Retrieved: {}", kv.get()?);
//!
//!     // Store an object as JSON
//!     kv.set_object(&User { name: "A".to_string(), age: 1 })?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod client;
pub mod config;
pub mod error;
pub mod keyvalue;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use keyvalue::KeyValue;
pub use transport::Transport;
pub use types::*;
