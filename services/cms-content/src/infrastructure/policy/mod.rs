//! 策略引擎集成

mod client;
mod transport;

pub use client::PolicyEngineClient;
pub use transport::{HttpPolicyTransport, PolicyTransport, PolicyUnavailable};
