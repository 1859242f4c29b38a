//! Storage infrastructure: the `rcon-client` configuration file.
//!
//! The `config` sub-module reads and writes the TOML file that tells the
//! binary which server to talk to, and turns it into an
//! [`RconConfig`](crate::application::client::RconConfig).

pub mod config;
