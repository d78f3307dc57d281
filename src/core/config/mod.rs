pub mod data;
pub mod defaults;
pub mod io;

pub use data::{Config, ConfigOverrides};
pub use io::{load_system_instruction, ConfigError};

#[cfg(test)]
mod tests;
