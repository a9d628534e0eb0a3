//! Dunbar Core Library
//!
//! Core functionality for Dunbar - tiered social circles and relationship
//! maintenance. This crate enforces per-tier capacity, computes what each
//! tier may see, schedules reconnect nudges and moves social graphs in and
//! out of the export format.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod config;
pub mod graph;
pub mod nudge;
pub mod portability;
pub mod tier;
pub mod visibility;

mod id;

pub use config::EngineConfig;
pub use graph::{AuthProvider, SocialGraphStore};
pub use tier::{Friend, Tier, TierCapacityLedger};
