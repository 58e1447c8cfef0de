//! Iterative least-squares range solver
//!
//! Minimizes the sum-of-squares range residual
//! `sum_i (|P - A_i| - d_i)^2` by fixed-step gradient descent. Convergence
//! is bounded by the fixed iteration budget rather than a residual
//! threshold; the result is an approximation adequate for room-scale
//! positioning, not a tight optimum.

use nalgebra::Vector3;

use crate::core::{RANGE_EPSILON, SOLVER_ITERATIONS, SOLVER_STEP};

/// Gradient-descent solver parameters
#[derive(Debug, Clone, Copy)]
pub struct DescentSolver {
    /// Fixed number of descent iterations
    pub iterations: usize,
    /// Fixed learning rate applied to the averaged gradient
    pub step: f64,
    /// Floor on anchor-estimate distances before dividing
    pub range_epsilon: f64,
}

impl Default for DescentSolver {
    fn default() -> Self {
        Self {
            iterations: SOLVER_ITERATIONS,
            step: SOLVER_STEP,
            range_epsilon: RANGE_EPSILON,
        }
    }
}

impl DescentSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solver with a custom iteration budget. The default budget trades
    /// accuracy for bounded per-reading latency; a larger budget tightens
    /// the fix when the caller can afford it.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Refine an estimate against `sites`, each a (anchor position,
    /// measured range) pair. `planar` restricts the solve to the xy-plane:
    /// ranges are measured in plan view and the z component of `start` is
    /// carried through unchanged.
    ///
    /// Returns the refined position and the sum-of-squares residual at it.
    pub fn solve(
        &self,
        sites: &[(Vector3<f64>, f64)],
        start: Vector3<f64>,
        planar: bool,
    ) -> (Vector3<f64>, f64) {
        let mut estimate = start;
        if sites.is_empty() {
            return (estimate, 0.0);
        }

        for _ in 0..self.iterations {
            let mut gradient = Vector3::zeros();
            for &(anchor, measured) in sites {
                let mut offset = estimate - anchor;
                if planar {
                    offset.z = 0.0;
                }
                let range = offset.norm().max(self.range_epsilon);
                let error = range - measured;
                gradient += offset * (error / range);
            }
            gradient /= sites.len() as f64;
            estimate -= gradient * self.step;
        }

        (estimate, self.residual(sites, &estimate, planar))
    }

    /// Sum-of-squares range error of `estimate` against `sites`
    pub fn residual(
        &self,
        sites: &[(Vector3<f64>, f64)],
        estimate: &Vector3<f64>,
        planar: bool,
    ) -> f64 {
        sites
            .iter()
            .map(|&(anchor, measured)| {
                let mut offset = estimate - anchor;
                if planar {
                    offset.z = 0.0;
                }
                let error = offset.norm() - measured;
                error * error
            })
            .sum()
    }
}
