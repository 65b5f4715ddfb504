//! `gf-intake` — getting routing solutions into the engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`wire`]      | `SolverResponse` and the camelCase DTOs the solver emits        |
//! | [`normalize`] | Lossy conversion of a response into a `gf_fleet::Solution`      |
//! | [`source`]    | `SolutionSource` trait, `JsonDirSource`, `ScriptedSource`, `Intake` |
//! | [`poll`]      | `poll_first_solution` — bounded startup polling                 |
//! | [`prefetch`]  | `Prefetcher` — one generation-tagged background fetch           |
//! | [`task`]      | `TaskHandle` — idempotently cancellable tokio task              |
//! | [`error`]     | `IntakeError`, `IntakeResult<T>`                                |
//!
//! A response with no route assignments is "not ready yet", never an error.
//! Everything else that is wrong with a response degrades record by record;
//! see [`normalize`].

pub mod error;
pub mod normalize;
pub mod poll;
pub mod prefetch;
pub mod source;
pub mod task;
pub mod wire;

#[cfg(test)]
mod tests;

pub use error::{IntakeError, IntakeResult};
pub use normalize::{NormalizeContext, normalize};
pub use poll::poll_first_solution;
pub use prefetch::{FetchPurpose, Prefetched, Prefetcher};
pub use source::{FILE_STAMP, Intake, JsonDirSource, Scripted, ScriptedSource, SolutionSource};
pub use task::TaskHandle;
pub use wire::{BlockageDto, GeneDto, OrderDto, SolverResponse, TagDto, TruckDto, WarehouseDto};
