//! A virtual pet whose fullness and energy keep moving with wall-clock time.
//!
//! Nothing runs in the background: every read catches the pet up with
//! [`sim::advance`], which integrates the elapsed time in closed form and
//! handles falling asleep from exhaustion and waking up again along the way.

pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod rules;
pub mod sim;
pub mod storage;
mod zero_floor;

pub use error::{NoOp, PetError, PetResult};
pub use model::{Pet, PetState, SleepState};
pub use rules::Rates;
pub use sim::{advance, advance_with_events, SimEvent};
