//! Traits for compute resource probing.

use crate::snapshot::data::ComputeInfo;

/// Source of the compute block of each snapshot.
///
/// Implementations must never fail: any sub-probe problem is folded into the
/// returned [`ComputeInfo`] as that resource's "unavailable" value. Every call
/// probes afresh; results are not reused across ticks.
pub trait ComputeProbe {
    fn probe(&mut self) -> ComputeInfo;
}

