//! Repository traits
//!
//! Persisted state (the active transport configuration, the recipient list,
//! the send log and the message draft) is reached only through these traits,
//! so the delivery code never depends on where that state lives.

pub mod repository;

pub use self::repository::{ConfigProvider, DraftStore, OutcomeSink, RecipientProvider, Repository};
