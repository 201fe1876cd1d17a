//! different utility modules used throughout the project
/// console and file logging (simplelog), one logger per process
pub mod logger;
