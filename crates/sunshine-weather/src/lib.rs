//! Weather data model for Sunshine Wear
//!
//! Snapshot types, condition-code to background mapping, and the wire
//! format of the in-process weather broadcast.

pub mod bus;
pub mod condition;
pub mod types;

pub use bus::{BusError, BusMessage, WeatherBundle, DATA_EVENT, DATA_KEY};
pub use condition::{
    condition_label, resolve_icon, resolve_in, validate_ranges, ConditionRange, RangeError,
    CONDITION_RANGES,
};
pub use types::*;
