//! Calibration Module
//!
//! Tracks a multi-point calibration sequence.
//!
//! ## States
//! ```text
//!            start (200)          pointend (remaining > 1)
//!   ┌──────┐ ─────────► ┌─────────────┐ ◄──┐
//!   │ Idle │            │ Calibrating │ ───┘
//!   └──────┘ ◄───────── └──────┬──────┘
//!       ▲       abort          │ pointend (last point)
//!       │                      ▼   + fetch calibresult
//!       │    abort        ┌────────┐
//!       └──────────────── │  Done  │ ── start (200) ──► Calibrating
//!                         └────────┘
//! ```
//!
//! `state` holds the pure transition rules; `session` issues the commands
//! and applies the acknowledgements.

mod state;
mod session;

pub use state::{CalibrationEvent, CalibrationOp, CalibrationState, FollowUp};
pub use session::{CalibrationSession, PointEndOutcome, STATUS_OK};
