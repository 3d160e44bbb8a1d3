pub mod candidate;
pub mod channel;
pub mod market;
pub mod result;
pub mod settings;
