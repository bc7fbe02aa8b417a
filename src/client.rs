//! Client Module
//!
//! Public API of the tracker server: one method per capability.
//!
//! ## Lifecycle
//! ```text
//! Disconnected ──connect──► Connected ──close──► Closed
//! ```
//! `Closed` is terminal: queries fail with `NotConnected` and `connect` is
//! refused.
//!
//! ## Usage
//! ```no_run
//! use eyetribe::Client;
//!
//! let mut client = Client::tcp();
//! client.connect("localhost", "6555")?;
//! println!("protocol version {}", client.version()?);
//! client.close();
//! # Ok::<(), eyetribe::EyeTribeError>(())
//! ```

use crate::calibration::{CalibrationSession, CalibrationState, PointEndOutcome};
use crate::config::Config;
use crate::correlator::Correlator;
use crate::error::{EyeTribeError, Result};
use crate::network::{TcpTransport, Transport};
use crate::protocol::{FromValue, Values, CATEGORY_TRACKER};

// =============================================================================
// Tracker Fields
// =============================================================================

const FIELD_VERSION: &str = "version";
const FIELD_TRACKER_STATE: &str = "trackerstate";
const FIELD_FRAMERATE: &str = "framerate";
const FIELD_IS_CALIBRATED: &str = "iscalibrated";
const FIELD_IS_CALIBRATING: &str = "iscalibrating";
const FIELD_SCREEN_INDEX: &str = "screenindex";
const FIELD_SCREEN_RES_H: &str = "screenresh";
const FIELD_SCREEN_RES_W: &str = "screenresw";
const FIELD_SCREEN_PSY_W: &str = "screenpsyw";
const FIELD_SCREEN_PSY_H: &str = "screenpsyh";
const FIELD_FRAME: &str = "frame";
const FIELD_CALIB_RESULT: &str = "calibresult";

/// Connection lifecycle of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Closed,
}

/// Client for one tracker server connection
///
/// Calls block until the server answers. A client serves one caller at a
/// time; share it across threads through [`SharedClient`](crate::SharedClient).
pub struct Client<T = TcpTransport> {
    correlator: Correlator<T>,

    calibration: CalibrationSession,

    connection: ConnectionState,

    /// Address of the last connect (or the configured one)
    host: Option<String>,
    port: Option<String>,
}

impl Client<TcpTransport> {
    /// Client over TCP with default configuration
    pub fn tcp() -> Self {
        Self::new(TcpTransport::default())
    }

    /// Client over TCP, remembering the configured address
    pub fn from_config(config: Config) -> Self {
        let host = config.host.clone();
        let port = config.port.clone();

        let mut client = Self::new(TcpTransport::new(config));
        client.host = Some(host);
        client.port = Some(port);
        client
    }
}

impl<T: Transport> Client<T> {
    /// Create a disconnected client over `transport`
    pub fn new(transport: T) -> Self {
        Self {
            correlator: Correlator::new(transport),
            calibration: CalibrationSession::new(),
            connection: ConnectionState::Disconnected,
            host: None,
            port: None,
        }
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to a running server
    pub fn connect(&mut self, host: &str, port: &str) -> Result<()> {
        if self.connection == ConnectionState::Closed {
            return Err(EyeTribeError::InvalidState {
                operation: "connect",
                state: "closed".to_string(),
            });
        }

        self.host = Some(host.to_string());
        self.port = Some(port.to_string());

        self.correlator.transport_mut().connect(host, port)?;
        self.connection = ConnectionState::Connected;
        Ok(())
    }

    /// Connect to the address given at construction
    pub fn connect_configured(&mut self) -> Result<()> {
        let (host, port) = match (&self.host, &self.port) {
            (Some(host), Some(port)) => (host.clone(), port.clone()),
            _ => {
                return Err(EyeTribeError::Config(
                    "no server address configured".to_string(),
                ))
            }
        };
        self.connect(&host, &port)
    }

    /// Close the connection; the client cannot be reused
    pub fn close(&mut self) {
        if self.connection == ConnectionState::Connected {
            self.correlator.transport_mut().close();
        }
        self.connection = ConnectionState::Closed;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn transport(&self) -> &T {
        self.correlator.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.correlator.transport_mut()
    }

    // =========================================================================
    // Tracker
    // =========================================================================

    /// Protocol version spoken by the server
    pub fn version(&mut self) -> Result<i64> {
        self.tracker(FIELD_VERSION)
    }

    /// Current tracker state code
    ///
    /// See <http://dev.theeyetribe.com/api/#tracker_state> for the codes.
    pub fn tracker_state(&mut self) -> Result<i64> {
        self.tracker(FIELD_TRACKER_STATE)
    }

    pub fn framerate(&mut self) -> Result<i64> {
        self.tracker(FIELD_FRAMERATE)
    }

    /// Whether the server holds a valid calibration
    pub fn is_calibrated(&mut self) -> Result<bool> {
        self.tracker(FIELD_IS_CALIBRATED)
    }

    /// Whether a calibration is in progress on the server
    pub fn is_calibrating(&mut self) -> Result<bool> {
        self.tracker(FIELD_IS_CALIBRATING)
    }

    /// Index of the screen in use
    pub fn screen_index(&mut self) -> Result<i64> {
        self.tracker(FIELD_SCREEN_INDEX)
    }

    /// Vertical screen resolution (pixels)
    pub fn screen_res_h(&mut self) -> Result<i64> {
        self.tracker(FIELD_SCREEN_RES_H)
    }

    /// Horizontal screen resolution (pixels)
    pub fn screen_res_w(&mut self) -> Result<i64> {
        self.tracker(FIELD_SCREEN_RES_W)
    }

    /// Physical screen width (meters)
    pub fn screen_psy_w(&mut self) -> Result<f64> {
        self.tracker(FIELD_SCREEN_PSY_W)
    }

    /// Physical screen height (meters)
    pub fn screen_psy_h(&mut self) -> Result<f64> {
        self.tracker(FIELD_SCREEN_PSY_H)
    }

    /// Latest gaze estimation frame, as sent by the server
    pub fn frame_data(&mut self) -> Result<Values> {
        self.tracker_values(FIELD_FRAME)
    }

    /// Last calibration result, as sent by the server
    pub fn calib_result(&mut self) -> Result<Values> {
        self.tracker_values(FIELD_CALIB_RESULT)
    }

    // =========================================================================
    // Calibration
    // =========================================================================

    /// Prepare the tracker for a calibration of `point_count` points
    pub fn calib_start(&mut self, point_count: u32) -> Result<bool> {
        self.ensure_connected()?;
        self.calibration.start(&mut self.correlator, point_count)
    }

    /// Start collecting the point at screen position `(x, y)`
    pub fn calib_point_start(&mut self, x: i64, y: i64) -> Result<bool> {
        self.ensure_connected()?;
        self.calibration.point_start(&mut self.correlator, x, y)
    }

    /// Stop collecting the current point
    ///
    /// After the last point this carries the overall calibration outcome.
    pub fn calib_point_end(&mut self) -> Result<PointEndOutcome> {
        self.ensure_connected()?;
        self.calibration.point_end(&mut self.correlator)
    }

    /// Abort the calibration in progress
    ///
    /// The local session returns to idle even when no server is reachable.
    pub fn calib_abort(&mut self) -> Result<bool> {
        if let Err(e) = self.ensure_connected() {
            self.calibration.reset();
            return Err(e);
        }
        self.calibration.abort(&mut self.correlator)
    }

    /// Clear the server's calibration
    pub fn calib_clear(&mut self) -> Result<bool> {
        self.ensure_connected()?;
        self.calibration.clear(&mut self.correlator)
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn ensure_connected(&self) -> Result<()> {
        match self.connection {
            ConnectionState::Connected => Ok(()),
            _ => Err(EyeTribeError::NotConnected),
        }
    }

    fn tracker<V: FromValue>(&mut self, field: &str) -> Result<V> {
        self.ensure_connected()?;
        self.correlator
            .query_as(CATEGORY_TRACKER, field)
            .map_err(|e| {
                tracing::debug!("Tracker query '{}' failed: {}", field, e);
                e
            })
    }

    fn tracker_values(&mut self, field: &str) -> Result<Values> {
        self.ensure_connected()?;
        self.correlator
            .fetch(CATEGORY_TRACKER, field)
            .map_err(|e| {
                tracing::debug!("Tracker fetch '{}' failed: {}", field, e);
                e
            })
    }
}
