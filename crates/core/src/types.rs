/// Sensor event times are integer epoch milliseconds.
pub type EpochMillis = i64;
