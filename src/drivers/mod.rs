//! Platform helpers used by the firmware entry point.

pub mod task_pin;
