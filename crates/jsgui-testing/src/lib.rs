//! Testing utilities and harness for jsgui

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
}
