//! Application core — pure domain logic, zero I/O.
//!
//! Link bring-up, sensor discovery and the acquisition cycle.  All
//! interaction with hardware and the network happens through the
//! **port traits** in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod link;
pub mod ports;
pub mod service;
