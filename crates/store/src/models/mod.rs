//! Records persisted by the store.
//!
//! Each submodule contains the stored entity (`Serialize` + `Deserialize`,
//! camelCase on disk) and the create DTO handed to its repository.

pub mod detection;
pub mod webhook_log;
