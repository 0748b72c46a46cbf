//! DevConnect - A small social feed for developers
//!
//! This library provides the server (accounts, tokens, posts, suggestions)
//! and a client for talking to it.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
