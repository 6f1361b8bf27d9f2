pub mod capture;
mod control;
