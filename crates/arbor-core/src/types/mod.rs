//! Domain value types.

mod compounding;
mod date;
mod interest_rate;

pub use compounding::Compounding;
pub use date::Date;
pub use interest_rate::InterestRate;
