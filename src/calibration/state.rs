//! Calibration state machine
//!
//! Pure transitions; no I/O happens here.

use std::fmt;

use crate::error::{EyeTribeError, Result};

/// Where a calibration sequence stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    /// No calibration in progress
    #[default]
    Idle,

    /// Points are being collected
    Calibrating { points_remaining: u32 },

    /// Last point acknowledged; the aggregate result has been fetched
    Done,
}

/// Operations a session can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOp {
    Start,
    PointStart,
    PointEnd,
    Abort,
    Clear,
}

/// Server acknowledgements that move the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationEvent {
    /// `start` accepted for `point_count` points
    Started { point_count: u32 },

    /// `pointend` acknowledged
    PointEnded,

    /// `abort` sent (whatever its outcome)
    Aborted,
}

/// Work the driver must do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Fetch the aggregate calibration result
    FetchResult,
}

impl CalibrationOp {
    pub fn name(&self) -> &'static str {
        match self {
            CalibrationOp::Start => "start calibration",
            CalibrationOp::PointStart => "start a calibration point",
            CalibrationOp::PointEnd => "end a calibration point",
            CalibrationOp::Abort => "abort calibration",
            CalibrationOp::Clear => "clear calibration",
        }
    }
}

impl CalibrationState {
    pub fn points_remaining(&self) -> u32 {
        match self {
            CalibrationState::Calibrating { points_remaining } => *points_remaining,
            _ => 0,
        }
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self, CalibrationState::Calibrating { .. })
    }

    /// Check that `op` may be sent in this state
    pub fn permits(&self, op: CalibrationOp) -> Result<()> {
        let allowed = match op {
            CalibrationOp::Start => !self.is_calibrating(),
            CalibrationOp::PointStart | CalibrationOp::PointEnd => self.is_calibrating(),
            CalibrationOp::Abort | CalibrationOp::Clear => true,
        };

        if allowed {
            Ok(())
        } else {
            Err(self.invalid(op.name()))
        }
    }

    /// Apply an event, returning the next state and any follow-up
    pub fn transition(self, event: CalibrationEvent) -> Result<(CalibrationState, Option<FollowUp>)> {
        match (self, event) {
            (_, CalibrationEvent::Started { point_count: 0 }) => Err(EyeTribeError::InvalidArgument(
                "calibration needs at least one point".to_string(),
            )),
            (CalibrationState::Idle | CalibrationState::Done, CalibrationEvent::Started { point_count }) => Ok((
                CalibrationState::Calibrating {
                    points_remaining: point_count,
                },
                None,
            )),
            (CalibrationState::Calibrating { points_remaining }, CalibrationEvent::PointEnded) => {
                match points_remaining.saturating_sub(1) {
                    0 => Ok((CalibrationState::Done, Some(FollowUp::FetchResult))),
                    left => Ok((
                        CalibrationState::Calibrating {
                            points_remaining: left,
                        },
                        None,
                    )),
                }
            }
            (_, CalibrationEvent::Aborted) => Ok((CalibrationState::Idle, None)),
            (state, CalibrationEvent::Started { .. }) => Err(state.invalid(CalibrationOp::Start.name())),
            (state, CalibrationEvent::PointEnded) => Err(state.invalid(CalibrationOp::PointEnd.name())),
        }
    }

    fn invalid(&self, operation: &'static str) -> EyeTribeError {
        EyeTribeError::InvalidState {
            operation,
            state: self.to_string(),
        }
    }
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationState::Idle => write!(f, "idle"),
            CalibrationState::Calibrating { points_remaining } => {
                write!(f, "calibrating ({} points remaining)", points_remaining)
            }
            CalibrationState::Done => write!(f, "done"),
        }
    }
}
