//! Query parameters.

use crate::error::{CollideError, CollideResult};

/// Parameters shared by the collision queries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryParams {
    /// Length of an inside-test ray, as a multiple of the grid diagonal plus
    /// the distance from the query point to the grid.
    ///
    /// Default: `100.0`
    pub ray_length_factor: f64,

    /// Distance below which a closest-point search stops looking.
    ///
    /// Default: `1e-9`
    pub negligible_distance: f64,

    /// Ignore triangles hit from behind in inside tests.
    ///
    /// Only meaningful for consistently oriented meshes.
    /// Default: `false`
    pub cull_backfaces: bool,

    /// Merge distance used to clean contour vertices before triangulation.
    ///
    /// Default: `1e-9`
    pub contour_epsilon: f64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            ray_length_factor: 100.0,
            negligible_distance: 1e-9,
            cull_backfaces: false,
            contour_epsilon: 1e-9,
        }
    }
}

impl QueryParams {
    /// Create params for surveyed terrain, where coordinates are large and
    /// millimetre differences do not matter.
    #[must_use]
    pub fn for_terrain() -> Self {
        Self {
            negligible_distance: 1e-4,
            contour_epsilon: 1e-3,
            ..Default::default()
        }
    }

    /// Set the inside-test ray length factor.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_collide::QueryParams;
    ///
    /// let params = QueryParams::default().with_ray_length_factor(10.0);
    /// assert_eq!(params.ray_length_factor, 10.0);
    /// assert!(params.validate().is_ok());
    /// ```
    #[must_use]
    pub const fn with_ray_length_factor(mut self, factor: f64) -> Self {
        self.ray_length_factor = factor;
        self
    }

    /// Set the negligible distance for closest-point searches.
    #[must_use]
    pub const fn with_negligible_distance(mut self, distance: f64) -> Self {
        self.negligible_distance = distance;
        self
    }

    /// Enable or disable backface culling in inside tests.
    #[must_use]
    pub const fn with_cull_backfaces(mut self, cull: bool) -> Self {
        self.cull_backfaces = cull;
        self
    }

    /// Set the contour vertex merge distance.
    #[must_use]
    pub const fn with_contour_epsilon(mut self, epsilon: f64) -> Self {
        self.contour_epsilon = epsilon;
        self
    }

    /// Checks that every parameter is in range.
    ///
    /// # Errors
    ///
    /// Returns [`CollideError::InvalidParams`] if the ray length factor is
    /// below one or a distance is negative or not finite.
    pub fn validate(&self) -> CollideResult<()> {
        if self.ray_length_factor < 1.0 || !self.ray_length_factor.is_finite() {
            return Err(CollideError::InvalidParams(format!(
                "ray_length_factor must be finite and at least 1, got {}",
                self.ray_length_factor
            )));
        }
        if self.negligible_distance < 0.0 || !self.negligible_distance.is_finite() {
            return Err(CollideError::InvalidParams(format!(
                "negligible_distance must be finite and non-negative, got {}",
                self.negligible_distance
            )));
        }
        if self.contour_epsilon < 0.0 || !self.contour_epsilon.is_finite() {
            return Err(CollideError::InvalidParams(format!(
                "contour_epsilon must be finite and non-negative, got {}",
                self.contour_epsilon
            )));
        }
        Ok(())
    }
}
