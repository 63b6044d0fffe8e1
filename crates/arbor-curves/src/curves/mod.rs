//! Yield curve implementations.
//!
//! - [`FlatForward`]: one forward rate, fixed or moving reference date
//! - [`InterpolatedForwardCurve`]: backward-flat forwards between dates
//! - Decorators over other curves: [`ImpliedTermStructure`],
//!   [`ForwardSpreadedTermStructure`], [`ZeroSpreadedTermStructure`] and
//!   [`CompositeZeroYieldStructure`]
//!
//! Decorators hold their inputs by handle. They can be built over empty
//! handles, fail with `CurveError::NoUnderlyingCurve` while an input is
//! missing, and forward every relink and spread change to their observers.

mod composite;
mod flat_forward;
mod forward_curve;
mod forward_spreaded;
mod implied;
mod zero_spreaded;

pub use composite::CompositeZeroYieldStructure;
pub use flat_forward::FlatForward;
pub use forward_curve::InterpolatedForwardCurve;
pub use forward_spreaded::ForwardSpreadedTermStructure;
pub use implied::ImpliedTermStructure;
pub use zero_spreaded::ZeroSpreadedTermStructure;
