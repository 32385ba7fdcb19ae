pub mod auth;
pub mod proposals;
pub mod settings;
pub mod voting;
