//! Low-level scanning helpers

pub mod cursor;

pub use cursor::Cursor;
