//! External variant calling and the read balance of its calls.

pub mod balance;
pub mod caller;

pub use balance::{parse_caller_output, parse_caller_reader, parse_record, VariantBalance};
pub use caller::{PlatypusCaller, DEFAULT_CALLER};
