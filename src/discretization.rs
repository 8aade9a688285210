use crate::Error;

/// Uniform sampling of one axis of the simulation domain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Discretization {
    /// Coordinate of the first node.
    pub min: f64,
    /// Coordinate of the last node.
    pub max: f64,
    /// Spacing between neighbouring nodes.
    pub step: f64,
    /// Only every `downsampling_ratio`-th node is kept when results are recorded.
    pub downsampling_ratio: usize,
}

impl Discretization {
    /// Creates a new axis, rejecting empty ranges and non-positive steps.
    pub fn new(axis: &'static str, min: f64, max: f64, step: f64) -> Result<Self, Error> {
        Self::with_downsampling(axis, min, max, step, 1)
    }

    /// Creates a new axis whose recorded output is thinned by `downsampling_ratio`.
    pub fn with_downsampling(
        axis: &'static str,
        min: f64,
        max: f64,
        step: f64,
        downsampling_ratio: usize,
    ) -> Result<Self, Error> {
        let valid = min.is_finite()
            && max.is_finite()
            && step.is_finite()
            && max > min
            && step > 0.0
            && downsampling_ratio >= 1;
        if !valid {
            return Err(Error::BadDiscretization {
                axis,
                min,
                max,
                step,
                downsampling_ratio,
            });
        }

        Ok(Self { min, max, step, downsampling_ratio })
    }

    /// Number of nodes on the axis, both end points included.
    #[inline]
    pub fn node_count(&self) -> usize {
        ((self.max - self.min) / self.step).round() as usize + 1
    }

    /// Number of nodes that survive downsampling.
    #[inline]
    pub fn recorded_count(&self) -> usize {
        (self.node_count() + self.downsampling_ratio - 1) / self.downsampling_ratio
    }

    /// Physical coordinate of node `index`. Negative indices and indices past the
    /// last node address the region outside the grid.
    #[inline]
    pub fn coord(&self, index: isize) -> f64 {
        self.min + (index as f64) * self.step
    }

    /// Index of the node closest to `coord`, clamped to the grid.
    pub fn closest_index(&self, coord: f64) -> usize {
        let raw = ((coord - self.min) / self.step).round();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.node_count() - 1)
        }
    }
}
