//! `gf-sim` — cycle controller and async runner for the gasfleet engine.
//!
//! # Tick
//!
//! ```text
//! per tick (one simulated step, N = 140 per cycle):
//!   ① Prefetch   — at steps_remaining - 1 == threshold, report the next
//!                  cycle's interval start once.
//!   ② Replenish  — secondary warehouses refilled when the step crosses
//!                  simulated midnight.
//!   ③ Advance    — every truck moves one node, burns fuel, recharges at the
//!                  central depot (parallel with the `parallel` feature).
//!   ④ Settle     — deliveries credited to orders in truck-code order.
//!   ⑤ Countdown  — steps_remaining - 1; at 0 the offered next solution is
//!                  adopted, or the tick reports the cycle exhausted.
//! ```
//!
//! [`Runner`] wraps a [`Cycle`] with a [`PlaybackClock`] and a background
//! `Prefetcher` and handles re-plans after breakdowns and the blocking
//! fallback fetch.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the truck-local phase on Rayon's thread pool.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use gf_core::EngineConfig;
//! use gf_sim::{NoopObserver, Runner};
//!
//! let mut runner = Runner::new(EngineConfig::default(), intake, start, NoopObserver)?;
//! runner.start().await?;
//! loop {
//!     let report = runner.step().await?;
//!     // render runner.cycle() ...
//! }
//! ```

pub mod builder;
pub mod cycle;
pub mod error;
pub mod observer;
pub mod playback;
pub mod runner;


pub use builder::CycleBuilder;
pub use cycle::{BreakdownCause, BreakdownReport, Cycle, CycleStatus, TickReport};
pub use error::{SimError, SimResult};
pub use observer::{CycleObserver, NoopObserver};
pub use playback::{
    FIXED_SECS_MAX, FIXED_SECS_MIN, PlaybackClock, PlaybackMode, fleet_average_speed,
    secs_per_node, tick_period,
};
pub use runner::Runner;
