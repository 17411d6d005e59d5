//! Vault game domain types.
//!
//! Defines the payout table, play state, observable snapshot and host commands used by the
//! execution layer and hosts.

mod command;
mod constants;
mod payout;
mod state;

pub use command::*;
pub use constants::*;
pub use payout::*;
pub use state::*;
