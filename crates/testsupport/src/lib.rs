//! Test support for the streaming engine workspace: canonical fixture
//! tables, producer helpers, and assertion shorthand.

pub mod assertions;
pub mod fixtures;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::fixtures::*;
}
