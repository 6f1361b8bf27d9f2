pub mod decibel;
pub mod double_buffer;
pub mod pacing;
pub mod sequence_guard;
