//! Fish lifecycle, simulation clock, and the pond actor loop.
//!
//! This crate owns the state-transition core of a pond: spawning,
//! aging, reaping, and releasing fish, plus the bookkeeping (stats,
//! persistence hand-off, metrics) that must stay consistent as fish
//! move between locally-owned and visitor states.
//!
//! # Modules
//!
//! - [`adapters`] -- [`FishStore`] and [`MetricsSink`] seams to the
//!   external persistence and metrics collaborators.
//! - [`clock`] -- Fixed-cadence tick counter and wall-clock spawn
//!   cadence.
//! - [`config`] -- Configuration loading from `shoal-config.yaml` into
//!   strongly-typed structs.
//! - [`lifecycle`] -- The [`Pond`] collection owner and its transition
//!   operations.
//! - [`runner`] -- The single-threaded actor loop that serializes all
//!   collection mutation.
//!
//! [`FishStore`]: adapters::FishStore
//! [`MetricsSink`]: adapters::MetricsSink
//! [`Pond`]: lifecycle::Pond

pub mod adapters;
pub mod clock;
pub mod config;
pub mod lifecycle;
pub mod runner;
