pub mod equivalences;
pub mod error;
pub mod id;
pub mod prelude;
pub mod segment_set;
