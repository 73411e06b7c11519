//! Wire-level types shared by workers, the cleaner and the record store.

mod domain;
pub use domain::*;
