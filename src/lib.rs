//! EnOcean sensor bridge library.
//!
//! Publishes readings of the radio-to-host sensor bridge as variables of a
//! browsable address space and keeps them refreshed on a fixed cadence.

pub mod address_space;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod publisher;
pub mod sensors;
pub mod server;
pub mod sync_job;
pub mod time_source;
