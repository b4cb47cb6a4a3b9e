//! Feature encoding components

pub mod encoder;

pub use encoder::FittedEncoder;
