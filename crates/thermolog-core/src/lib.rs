//! Hardware-independent core library for thermolog
//!
//! This crate contains all platform-agnostic logic for the thermolog temperature
//! logger: the circular reading history and its persisted layout, the shared state
//! that the two workers coordinate through, button debouncing, the sampling/render
//! loop, the input worker and the display renderer.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop hosts
//! (for the simulator and tests).

#![no_std]

pub mod app_state;
pub mod config;
pub mod display;
pub mod history;
pub mod input;
pub mod sampling;
pub mod sensors;
pub mod startup;
pub mod storage;
