//! Common types for the beatthebank vault game.
//!
//! Everything here is plain data: constants, the payout table, the observable
//! session snapshot and the commands a host can issue. The state machine that
//! mutates these lives in `beatthebank-execution`.

pub mod vault;

pub use vault::*;
