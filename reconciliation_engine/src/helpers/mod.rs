mod amounts;
pub mod payload;

pub use amounts::{parse_decimal, value_as_decimal};
