//! Scalar types shared by every series in the model.

/// Floating point type used for all model values.
pub type FloatValue = f64;

/// Index of a step along the time axis of a run.
///
/// Steps are unit length; the model has no notion of calendar time.
pub type Timestep = usize;
