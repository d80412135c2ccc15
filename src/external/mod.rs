pub mod ai_gateway;

#[cfg(test)]
pub mod fake;

pub use ai_gateway::*;
