//! Scalar root finding for monotonically increasing functions.
//!
//! The carbon cycle needs, at every step and for every ensemble member, the
//! time-scale factor that reproduces a target integrated impulse response. The
//! function being inverted is strictly increasing on $(0, \infty)$ and bounded,
//! so a bracket can always be grown outwards from a starting point until the
//! residual changes sign. The bracket is then refined by bisection.
//!
//! The [`SolverContext`] carries the configuration and the previous root. It is
//! owned by the integration loop: [`SolverContext::solve`] does not mutate it,
//! and [`SolverContext::with_seed`] produces the context for the next step.

use std::convert::Infallible;

use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;

/// Relative width of the first bracket grown from the starting point.
const INITIAL_BRACKET_WIDTH: FloatValue = 0.1;

/// A strictly increasing function on $(0, \infty)$.
pub trait IncreasingFunction {
    /// Value of the function at `x > 0`.
    fn value(&self, x: FloatValue) -> FloatValue;

    /// Limits of the function as `x -> 0+` and `x -> inf`.
    fn limits(&self) -> (FloatValue, FloatValue);
}

/// Errors that can occur while solving for a root.
#[derive(Debug, Error)]
pub enum SolveError {
    /// No positive `x` reaches the target.
    #[error("target {target} lies outside the attainable range ({lower}, {upper})")]
    TargetOutOfRange {
        target: FloatValue,
        lower: FloatValue,
        upper: FloatValue,
    },

    /// The bisection solver encountered an error.
    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    /// The solver reached the iteration limit without converging.
    #[error("solver hit iteration limit: root={root}, residual={residual:e}, iters={iters}")]
    MaxIters {
        /// Last iterate.
        root: FloatValue,
        /// Residual at the last iterate.
        residual: FloatValue,
        /// Bracketing and bisection iterations performed.
        iters: usize,
    },

    /// The function produced NaN or an infinity while bracketing.
    #[error("function evaluation is not finite at x={x}")]
    NonFinite { x: FloatValue },
}

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum iteration count, shared by bracketing and bisection.
    pub max_iters: usize,

    /// Absolute tolerance on the root.
    pub x_abs_tol: FloatValue,

    /// Relative tolerance on the root.
    pub x_rel_tol: FloatValue,

    /// Absolute tolerance on the residual.
    ///
    /// Zero leaves convergence to the root tolerances.
    pub residual_tol: FloatValue,

    /// Starting point used when there is no previous root.
    pub initial_guess: FloatValue,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            x_abs_tol: 1e-12,
            x_rel_tol: 1e-14,
            residual_tol: 0.0,
            initial_guess: 0.16,
        }
    }
}

impl SolverConfig {
    /// Converts this configuration into a bisection solver configuration.
    fn bisection(&self, max_iters: usize) -> bisection::Config {
        bisection::Config {
            max_iters,
            x_abs_tol: self.x_abs_tol,
            x_rel_tol: self.x_rel_tol,
            residual_tol: self.residual_tol,
        }
    }
}

/// A converged root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub root: FloatValue,
    pub residual: FloatValue,
    pub iters: usize,
}

/// A function value together with the point it was evaluated at.
#[derive(Debug, Clone, Copy)]
struct Evaluation {
    x: FloatValue,
    value: FloatValue,
}

/// Model adapter exposing an [`IncreasingFunction`] to the bisection solver.
struct FunctionModel<'a, F> {
    function: &'a F,
}

impl<F: IncreasingFunction> Model for FunctionModel<'_, F> {
    type Input = FloatValue;
    type Output = Evaluation;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(Evaluation {
            x: *input,
            value: self.function.value(*input),
        })
    }
}

/// Equation problem with residual `value - target`.
struct TargetProblem {
    target: FloatValue,
}

impl EquationProblem<1> for TargetProblem {
    type Input = FloatValue;
    type Output = Evaluation;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.value - self.target])
    }
}

/// A sign-changing bracket `residual(lo) < 0 < residual(hi)`.
struct Bracket {
    lo: FloatValue,
    hi: FloatValue,
    iters: usize,
}

/// Solver state threaded through successive solves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverContext {
    config: SolverConfig,
    seed: Option<FloatValue>,
}

impl SolverContext {
    /// A context without a previous root.
    pub fn new(config: SolverConfig) -> Self {
        Self { config, seed: None }
    }

    /// The context to use after a solve that found `root`.
    pub fn with_seed(self, root: FloatValue) -> Self {
        Self {
            config: self.config,
            seed: Some(root),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The previous root, if any.
    pub fn seed(&self) -> Option<FloatValue> {
        self.seed
    }

    fn starting_point(&self) -> FloatValue {
        match self.seed {
            Some(seed) if seed.is_finite() && seed > 0.0 => seed,
            _ => self.config.initial_guess,
        }
    }

    /// Grow a bracket geometrically outwards from `x`, whose residual is `r`.
    ///
    /// The relative width doubles at every step, towards infinity for a
    /// negative residual and towards zero for a positive one.
    fn bracket(
        &self,
        residual: impl Fn(FloatValue) -> Result<FloatValue, SolveError>,
        x: FloatValue,
        r: FloatValue,
    ) -> Result<Bracket, SolveError> {
        let mut width = INITIAL_BRACKET_WIDTH;
        let (mut inner, mut inner_r) = (x, r);
        let mut iters = 0;

        loop {
            if iters >= self.config.max_iters {
                return Err(SolveError::MaxIters {
                    root: inner,
                    residual: inner_r,
                    iters,
                });
            }
            iters += 1;

            let outer = if r < 0.0 {
                inner * (1.0 + width)
            } else {
                inner / (1.0 + width)
            };
            let outer_r = residual(outer)?;

            if r < 0.0 && outer_r > 0.0 {
                return Ok(Bracket {
                    lo: inner,
                    hi: outer,
                    iters,
                });
            }
            if r > 0.0 && outer_r < 0.0 {
                return Ok(Bracket {
                    lo: outer,
                    hi: inner,
                    iters,
                });
            }
            if outer_r == 0.0 {
                return Ok(Bracket {
                    lo: outer,
                    hi: outer,
                    iters,
                });
            }

            inner = outer;
            inner_r = outer_r;
            width *= 2.0;
        }
    }

    /// Find `x > 0` such that `function.value(x) == target`.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::TargetOutOfRange`] if the target is not strictly
    /// between the limits of the function, [`SolveError::MaxIters`] if the
    /// tolerances are not met within the iteration budget,
    /// [`SolveError::NonFinite`] if the function misbehaves while bracketing and
    /// [`SolveError::Bisection`] if the bisection solver fails.
    pub fn solve(
        &self,
        function: &impl IncreasingFunction,
        target: FloatValue,
    ) -> Result<Solution, SolveError> {
        let (lower, upper) = function.limits();
        if !(target > lower && target < upper) {
            return Err(SolveError::TargetOutOfRange {
                target,
                lower,
                upper,
            });
        }

        let residual = |x: FloatValue| {
            let r = function.value(x) - target;
            if r.is_finite() {
                Ok(r)
            } else {
                Err(SolveError::NonFinite { x })
            }
        };

        let x = self.starting_point();
        let r = residual(x)?;
        if r == 0.0 {
            return Ok(Solution {
                root: x,
                residual: r,
                iters: 0,
            });
        }

        let bracket = self.bracket(residual, x, r)?;
        if bracket.lo == bracket.hi {
            return Ok(Solution {
                root: bracket.lo,
                residual: 0.0,
                iters: bracket.iters,
            });
        }

        let remaining = self.config.max_iters - bracket.iters;
        if remaining == 0 {
            return Err(SolveError::MaxIters {
                root: bracket.hi,
                residual: residual(bracket.hi)?,
                iters: bracket.iters,
            });
        }

        let model = FunctionModel { function };
        let problem = TargetProblem { target };
        let solution = bisection::solve(
            &model,
            &problem,
            [bracket.lo, bracket.hi],
            &self.config.bisection(remaining),
            |_event: &bisection::Event<'_, _, _>| -> Option<bisection::Action> { None },
        )?;

        let root = solution.snapshot.output.x;
        let iters = bracket.iters + solution.iters;
        if solution.status != bisection::Status::Converged {
            return Err(SolveError::MaxIters {
                root,
                residual: solution.residual,
                iters,
            });
        }

        trace!(root, residual = solution.residual, iters, "time-scale solve converged");
        Ok(Solution {
            root,
            residual: solution.residual,
            iters,
        })
    }
}

impl Default for SolverContext {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}
