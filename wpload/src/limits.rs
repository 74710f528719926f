//! Per-airframe waypoint capacity.
//!
//! Each airframe stores a fixed number of points per kind. A point whose
//! display number exceeds its kind's capacity is silently dropped, as is any
//! point of a kind the airframe has no slot for.

use std::collections::HashMap;

use tracing::debug;

use crate::profile::{Waypoint, WaypointKind};

/// Capacity of one waypoint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many points (numbers `1..=n`).
    Max(u32),
    /// No upper bound.
    Unbounded,
}

impl Limit {
    /// Whether a point with this 1-based number fits.
    pub fn admits(self, number: u32) -> bool {
        match self {
            Limit::Max(max) => number <= max,
            Limit::Unbounded => true,
        }
    }
}

/// Capacity table for one airframe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AirframeLimits {
    limits: HashMap<WaypointKind, Limit>,
}

impl AirframeLimits {
    /// An empty table that admits nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the capacity of a kind.
    pub fn with(mut self, kind: WaypointKind, limit: Limit) -> Self {
        self.limits.insert(kind, limit);
        self
    }

    /// Capacity of a kind, `None` when the airframe has no slot for it.
    pub fn get(&self, kind: WaypointKind) -> Option<Limit> {
        self.limits.get(&kind).copied()
    }

    /// Whether the airframe accepts any point of this kind.
    pub fn supports(&self, kind: WaypointKind) -> bool {
        self.limits.contains_key(&kind)
    }
}

/// Whether a single point fits within the airframe's capacity.
pub fn validate(waypoint: &Waypoint, limits: &AirframeLimits) -> bool {
    limits
        .get(waypoint.kind)
        .is_some_and(|limit| limit.admits(waypoint.number))
}

/// Drops points that do not fit and orders the rest by kind tag.
///
/// The sort is stable, so points of the same kind keep their profile order.
pub fn validate_all<'a, I>(waypoints: I, limits: &AirframeLimits) -> Vec<Waypoint>
where
    I: IntoIterator<Item = &'a Waypoint>,
{
    let mut accepted: Vec<Waypoint> = waypoints
        .into_iter()
        .filter(|wp| {
            let ok = validate(wp, limits);
            if !ok {
                debug!(waypoint = %wp, "Dropping waypoint outside airframe limits");
            }
            ok
        })
        .cloned()
        .collect();

    accepted.sort_by_key(|wp| wp.kind.tag());
    accepted
}
