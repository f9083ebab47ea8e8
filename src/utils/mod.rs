//! Internal utilities shared by the key and node layers.

pub mod bit_window;
pub mod tag_scan;
