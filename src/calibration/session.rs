//! Calibration session
//!
//! Drives the calibration commands through a correlator and feeds the
//! acknowledgements into the state machine.

use super::state::{CalibrationEvent, CalibrationOp, CalibrationState, FollowUp};
use crate::correlator::{Correlator, MatchKey};
use crate::error::{EyeTribeError, Result};
use crate::network::Transport;
use crate::protocol::{Values, CATEGORY_CALIBRATION, CATEGORY_TRACKER, VERB_GET};

/// Status code of a successful command
pub const STATUS_OK: i64 = 200;

const NO_PARAMS: [(&str, i64); 0] = [];

/// Result of ending a calibration point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEndOutcome {
    /// Whether the point was accepted
    ///
    /// Always true for the last point, whose own acknowledgement is replaced
    /// by the aggregate result.
    pub acknowledged: bool,

    /// Aggregate calibration outcome, present only after the last point
    pub calibration_result: Option<bool>,
}

/// Bookkeeping for one client's calibration sequence
#[derive(Debug, Default)]
pub struct CalibrationSession {
    state: CalibrationState,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn points_remaining(&self) -> u32 {
        self.state.points_remaining()
    }

    /// Begin a calibration of `point_count` points
    ///
    /// The state only changes when the server answers 200.
    pub fn start<T: Transport>(&mut self, correlator: &mut Correlator<T>, point_count: u32) -> Result<bool> {
        self.state.permits(CalibrationOp::Start)?;
        if point_count == 0 {
            return Err(EyeTribeError::InvalidArgument(
                "calibration needs at least one point".to_string(),
            ));
        }

        let status = correlator.command(
            CATEGORY_CALIBRATION,
            "start",
            [("pointcount", i64::from(point_count))],
        )?;

        if status != STATUS_OK {
            tracing::debug!("Calibration start refused with status {}", status);
            return Ok(false);
        }

        self.apply(CalibrationEvent::Started { point_count })?;
        Ok(true)
    }

    /// Announce the screen position of the next point
    pub fn point_start<T: Transport>(&mut self, correlator: &mut Correlator<T>, x: i64, y: i64) -> Result<bool> {
        self.state.permits(CalibrationOp::PointStart)?;

        let status = correlator.command(CATEGORY_CALIBRATION, "pointstart", [("x", x), ("y", y)])?;
        Ok(status == STATUS_OK)
    }

    /// Finish the current point
    ///
    /// After the last point the session fetches the aggregate result and
    /// returns it in place of the point acknowledgement.
    pub fn point_end<T: Transport>(&mut self, correlator: &mut Correlator<T>) -> Result<PointEndOutcome> {
        self.state.permits(CalibrationOp::PointEnd)?;

        let status = correlator.command(CATEGORY_CALIBRATION, "pointend", NO_PARAMS)?;

        match self.apply(CalibrationEvent::PointEnded)? {
            None => Ok(PointEndOutcome {
                acknowledged: status == STATUS_OK,
                calibration_result: None,
            }),
            Some(FollowUp::FetchResult) => {
                tracing::debug!("Last calibration point done, fetching result");
                let values = correlator.fetch_matching(
                    CATEGORY_TRACKER,
                    "calibresult",
                    MatchKey::Category(CATEGORY_TRACKER),
                )?;

                Ok(PointEndOutcome {
                    acknowledged: true,
                    calibration_result: Some(calibration_outcome(&values)?),
                })
            }
        }
    }

    /// Abort the calibration
    ///
    /// Local state returns to idle even when the command fails, so the client
    /// can disagree with the server afterwards.
    pub fn abort<T: Transport>(&mut self, correlator: &mut Correlator<T>) -> Result<bool> {
        self.state.permits(CalibrationOp::Abort)?;

        let result = correlator.command(CATEGORY_CALIBRATION, "abort", NO_PARAMS);
        self.apply(CalibrationEvent::Aborted)?;

        match result {
            Ok(status) => Ok(status == STATUS_OK),
            Err(e) => {
                tracing::warn!("Calibration abort failed ({}); local state reset anyway", e);
                Err(e)
            }
        }
    }

    /// Return to idle without contacting the server
    pub fn reset(&mut self) {
        if self.state != CalibrationState::Idle {
            tracing::debug!("Calibration {} -> {} (local reset)", self.state, CalibrationState::Idle);
        }
        self.state = CalibrationState::Idle;
    }

    /// Clear the server's calibration; local state is untouched
    pub fn clear<T: Transport>(&mut self, correlator: &mut Correlator<T>) -> Result<bool> {
        self.state.permits(CalibrationOp::Clear)?;

        let status = correlator.command(CATEGORY_CALIBRATION, "clear", NO_PARAMS)?;
        Ok(status == STATUS_OK)
    }

    fn apply(&mut self, event: CalibrationEvent) -> Result<Option<FollowUp>> {
        let (next, follow_up) = self.state.transition(event)?;
        tracing::debug!("Calibration {} -> {}", self.state, next);
        self.state = next;
        Ok(follow_up)
    }
}

/// Pull the boolean outcome out of a calibration result mapping
///
/// Accepts `{"result": bool, ...}` or the nested
/// `{"calibresult": {"result": bool, ...}}`.
fn calibration_outcome(values: &Values) -> Result<bool> {
    if let Some(result) = values.get_as::<bool>("result")? {
        return Ok(result);
    }

    if let Some(nested) = values.get_as::<Values>("calibresult")? {
        if let Some(result) = nested.get_as::<bool>("result")? {
            return Ok(result);
        }
    }

    Err(EyeTribeError::FieldMissing {
        category: CATEGORY_TRACKER.to_string(),
        request: VERB_GET.to_string(),
        field: "result".to_string(),
    })
}
