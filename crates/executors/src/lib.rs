pub mod resolver;
pub mod result;
pub mod runner;
