pub mod action;
pub mod assertion;
pub mod claims;
pub mod user;
