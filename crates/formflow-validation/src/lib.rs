//! formflow validation core
//!
//! Pure, deterministic check functions used by the field validators of the
//! `formflow` crate. Nothing in here allocates state or touches I/O; every
//! function returns the same answer for the same input.

pub mod collection;
pub mod decimal;
pub mod email;
pub mod file;
pub mod network;
pub mod numeric;
pub mod password;
pub mod string;

pub use collection::*;
pub use decimal::{Decimal, DecimalParseError, PrecisionViolation};
pub use email::*;
pub use file::*;
pub use network::*;
pub use numeric::*;
pub use password::*;
pub use string::*;
