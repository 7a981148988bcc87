//! Background Tasks Module
//!
//! Contains background tasks that run alongside cache operation.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals

mod sweep;

pub(crate) use sweep::{purge_expired, spawn_sweep_task};
