pub mod ensure;
pub mod platform;
pub mod probe;
