pub mod base;
pub mod inputs;
pub mod lookup;
pub mod traits;

pub use lookup::LookupField;
