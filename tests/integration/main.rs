//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one coordination path
//! against mock adapters. All tests run on the host with no hardware.

mod advisory_flow;
mod end_to_end;
mod frame_pipeline;
mod mock_ports;
mod render_core;
