//! Obstacle distance summary of a lidar sweep.

use thiserror::Error;

/// Ranges at or below this value are treated as "no return".
pub const MIN_VALID_RANGE: f64 = 0.01;

/// Ranges at or beyond this value are outside the sensor's trusted window.
pub const MAX_VALID_RANGE: f64 = 3.5;

/// Samples taken from each end of the sweep to form the front cone.
pub const FRONT_CONE_HALF_WIDTH: usize = 10;

/// Distance reported when nothing usable was measured.
pub const UNKNOWN_DISTANCE: f64 = -1.0;

/// Why a sweep could not be summarized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    #[error("front cone mean is not finite ({0})")]
    NonFiniteFront(f64),
}

/// Nearest and forward obstacle distances of one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LidarSummary {
    pub min_distance: f64,
    pub front_distance: f64,
}

impl Default for LidarSummary {
    fn default() -> Self {
        Self::unknown()
    }
}

impl LidarSummary {
    /// Both distances unknown.
    pub fn unknown() -> Self {
        Self {
            min_distance: UNKNOWN_DISTANCE,
            front_distance: UNKNOWN_DISTANCE,
        }
    }

    /// Summarize a sweep whose samples start straight ahead.
    ///
    /// The minimum only considers samples strictly inside
    /// (`MIN_VALID_RANGE`, `MAX_VALID_RANGE`). The front distance is the mean
    /// of the positive returns among the first and last ten samples, and is
    /// only computed for sweeps longer than twice the cone width.
    pub fn from_ranges(ranges: &[f64]) -> Result<Self, ScanError> {
        let min_distance = ranges
            .iter()
            .copied()
            .filter(|r| *r > MIN_VALID_RANGE && *r < MAX_VALID_RANGE)
            .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |m| m.min(r))))
            .unwrap_or(UNKNOWN_DISTANCE);

        let mut front_distance = UNKNOWN_DISTANCE;
        if ranges.len() > 2 * FRONT_CONE_HALF_WIDTH {
            let head = &ranges[..FRONT_CONE_HALF_WIDTH];
            let tail = &ranges[ranges.len() - FRONT_CONE_HALF_WIDTH..];
            let front: Vec<f64> = head
                .iter()
                .chain(tail)
                .copied()
                .filter(|r| *r > MIN_VALID_RANGE)
                .collect();

            if !front.is_empty() {
                let mean = front.iter().sum::<f64>() / front.len() as f64;
                if !mean.is_finite() {
                    return Err(ScanError::NonFiniteFront(mean));
                }
                front_distance = mean;
            }
        }

        Ok(Self {
            min_distance,
            front_distance,
        })
    }
}
