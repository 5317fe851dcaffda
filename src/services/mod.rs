pub mod ecosystem;
pub mod request_builder;
pub mod submission;
