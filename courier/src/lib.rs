//! Batched bulk email campaigns over SMTP
//!
//! Ties the store, the delivery client and the HTTP API together behind a
//! single RON configuration file.

pub mod config;
pub mod controller;
