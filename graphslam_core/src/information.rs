//! Information form of the 2D SLAM problem.
//!
//! State layout (each entry one scalar coordinate):
//!
//! ```text
//! [ p0.x p0.y | p1.x p1.y | ... | p{T-1}.x p{T-1}.y | l0.x l0.y | ... | l{L-1}.x l{L-1}.y ]
//!   2t + d                                            2T + 2l + d
//! ```
//!
//! Every constraint is a relative one between two scalars `i` and `j`
//! (`x_j - x_i ≈ value`), so updates come in symmetric 2x2 blocks and Ω stays
//! symmetric by construction.

use nalgebra::{DMatrix, DVector};

/// Information matrix Ω and information vector ξ.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationSystem {
    omega: DMatrix<f64>,
    xi: DVector<f64>,
    steps: usize,
}

impl InformationSystem {
    /// Allocates a zeroed system and anchors pose 0 at the world center.
    ///
    /// The anchor is the only absolute information in the system; without it
    /// every relative constraint is translation invariant and Ω is singular.
    pub fn new(steps: usize, num_landmarks: usize, world_size: f64) -> Self {
        let dim = 2 * (steps + num_landmarks);
        let mut omega = DMatrix::zeros(dim, dim);
        let mut xi = DVector::zeros(dim);

        let center = world_size / 2.0;
        omega[(0, 0)] = 1.0;
        omega[(1, 1)] = 1.0;
        xi[0] = center;
        xi[1] = center;

        Self {
            omega,
            xi,
            steps,
        }
    }

    /// Index of pose `t`'s coordinate `axis`.
    #[inline]
    pub fn pose_index(&self, t: usize, axis: usize) -> usize {
        2 * t + axis
    }

    /// Index of landmark `id`'s coordinate `axis`.
    #[inline]
    pub fn landmark_index(&self, id: usize, axis: usize) -> usize {
        2 * self.steps + 2 * id + axis
    }

    pub fn dim(&self) -> usize {
        self.xi.len()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn omega(&self) -> &DMatrix<f64> {
        &self.omega
    }

    pub fn xi(&self) -> &DVector<f64> {
        &self.xi
    }

    /// Adds the relative constraint `x_j - x_i = value` with weight `weight`.
    pub fn add_constraint(&mut self, i: usize, j: usize, value: f64, weight: f64) {
        self.omega[(i, i)] += weight;
        self.omega[(i, j)] -= weight;
        self.omega[(j, i)] -= weight;
        self.omega[(j, j)] += weight;

        self.xi[i] -= value * weight;
        self.xi[j] += value * weight;
    }

    /// True if `Ω[i][j] == Ω[j][i]` for every pair.
    pub fn is_symmetric(&self) -> bool {
        self.omega == self.omega.transpose()
    }

    /// State indices whose row in Ω is entirely zero.
    ///
    /// A landmark that was never measured leaves its two rows empty; this is
    /// the usual reason a solve fails.
    pub fn unconstrained_indices(&self) -> Vec<usize> {
        (0..self.dim())
            .filter(|&i| self.omega.row(i).iter().all(|&v| v == 0.0))
            .collect()
    }

    /// Consumes the system, handing Ω and ξ to the solver.
    pub(crate) fn into_parts(self) -> (DMatrix<f64>, DVector<f64>) {
        (self.omega, self.xi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initialization_dimensions_and_anchor() {
        let system = InformationSystem::new(4, 3, 100.0);

        assert_eq!(system.dim(), 14);
        assert_eq!(system.omega().shape(), (14, 14));
        assert_eq!(system.omega()[(0, 0)], 1.0);
        assert_eq!(system.omega()[(1, 1)], 1.0);
        assert_eq!(system.xi()[0], 50.0);
        assert_eq!(system.xi()[1], 50.0);

        // Everything else starts at zero
        assert_eq!(system.omega().iter().filter(|&&v| v != 0.0).count(), 2);
        assert_eq!(system.xi().iter().filter(|&&v| v != 0.0).count(), 2);
    }

    #[test]
    fn test_index_layout() {
        let system = InformationSystem::new(5, 2, 10.0);

        assert_eq!(system.pose_index(0, 0), 0);
        assert_eq!(system.pose_index(0, 1), 1);
        assert_eq!(system.pose_index(4, 1), 9);
        assert_eq!(system.landmark_index(0, 0), 10);
        assert_eq!(system.landmark_index(1, 1), 13);
        assert_eq!(system.landmark_index(1, 1), system.dim() - 1);
    }

    #[test]
    fn test_constraint_update_is_symmetric_block() {
        let mut system = InformationSystem::new(2, 1, 10.0);
        system.add_constraint(0, 4, 3.0, 0.5);

        let omega = system.omega();
        assert_relative_eq!(omega[(0, 0)], 1.5);
        assert_relative_eq!(omega[(0, 4)], -0.5);
        assert_relative_eq!(omega[(4, 0)], -0.5);
        assert_relative_eq!(omega[(4, 4)], 0.5);
        assert_relative_eq!(system.xi()[0], 5.0 - 1.5);
        assert_relative_eq!(system.xi()[4], 1.5);
        assert!(system.is_symmetric());
    }

    #[test]
    fn test_unconstrained_indices() {
        let mut system = InformationSystem::new(2, 2, 10.0);
        system.add_constraint(0, 2, 1.0, 1.0);
        system.add_constraint(1, 3, 0.0, 1.0);
        system.add_constraint(0, 4, 1.0, 1.0);
        system.add_constraint(1, 5, 1.0, 1.0);

        // Landmark 1 (indices 6, 7) never touched
        assert_eq!(system.unconstrained_indices(), vec![6, 7]);
    }
}
