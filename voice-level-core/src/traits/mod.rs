pub mod input_device;
pub mod level_observer;
