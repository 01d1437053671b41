//! Model estimation routines used by the step templates.
//!
//! Thin, synchronous fit/predict implementations over `ndarray`: ordinary
//! least squares and binary logit. Fitted values are plain serializable
//! structs so templates can persist them alongside their configuration.

pub mod error;
pub mod linear;
pub mod logit;
mod solve;

pub use error::EstimationError;
pub use linear::{FittedLinear, LinearModel};
pub use logit::{FittedLogit, LogitModel};
