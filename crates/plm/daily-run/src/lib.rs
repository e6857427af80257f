//! PLM Daily Run - The single integration point for the scheduled cycle
//!
//! Called once per cycle per model by the daily-run orchestrator, which
//! supplies the resolved-outcome count and the freshly computed drift
//! severity. The runner sequences the fixed step order (live-sample
//! ingest, drift check, settlement diff, warm-up advance, auto-promotion,
//! integrity guard), each step taking the prior step's typed result.
//!
//! Every step is independently idempotent: re-running the same cycle for
//! the same model (e.g. after a crash between steps) must not double-count
//! samples or warm-up days. The cycle key is the UTC calendar date of the
//! supplied `now`.

#![deny(unsafe_code)]

pub mod runner;
pub mod steps;

pub use runner::{CycleInput, CycleReport, DailyCycleRunner};
pub use steps::{
    cycle_key, DriftCheckOutcome, HookSettleOutcome, IntegrityOutcome, LiveSampleOutcome,
    WarmupProgressOutcome,
};
