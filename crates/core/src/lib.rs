//! Speed trap domain core.
//!
//! Pure logic shared by the API server and the store:
//!
//! - [`payload`]: serde model of inbound webhook deliveries.
//! - [`trigger`]: line-crossing events and the alarm context they arrive with.
//! - [`correlation`]: the pending-trigger table that pairs events across
//!   deliveries.
//! - [`speed`]: conversion of a matched pair into a [`speed::SpeedReading`].

pub mod correlation;
pub mod error;
pub mod payload;
pub mod speed;
pub mod trigger;
pub mod types;
