//! prelude exports common things for the 3903 such as the instruction set
//! tables and bit helpers.

/// prelude exports common items for the 3903.
pub mod prelude {
    pub use isa::*;
}
