//! Retained mesh-anchor positions and the placement validity heuristic.
use bevy::prelude::*;

use crate::utils::ar_session::AnchorId;

/// World position of a mesh anchor reported by the tracker
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub anchor: AnchorId,
    pub position: Vec3,
}

/// Every mesh anchor added since the last reset
#[derive(Resource, Default, Debug)]
pub struct SurfaceSamples {
    samples: Vec<SurfaceSample>,
}

impl SurfaceSamples {
    pub fn push(&mut self, sample: SurfaceSample) {
        self.samples.push(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SurfaceSample> {
        self.samples.iter()
    }

    /// Closest sample no farther than `cutoff` from `position`.
    pub fn nearest_within(&self, position: Vec3, cutoff: f32) -> Option<&SurfaceSample> {
        self.samples
            .iter()
            .map(|sample| (sample, sample.position.distance(position)))
            .filter(|(_, distance)| *distance <= cutoff)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(sample, _)| sample)
    }

    /// A position is valid when at least one sample lies within `cutoff`.
    /// This is a nearest-sample heuristic, not a coverage check.
    pub fn is_valid_position(&self, position: Vec3, cutoff: f32) -> bool {
        match self.nearest_within(position, cutoff) {
            Some(sample) => {
                debug!(
                    "Position {position} backed by anchor {:?} at {}",
                    sample.anchor,
                    sample.position
                );
                true
            }
            None => false,
        }
    }
}
