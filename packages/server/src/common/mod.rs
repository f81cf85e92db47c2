// Common types shared across domains and the HTTP layer

pub mod errors;

pub use errors::ErrorCode;
