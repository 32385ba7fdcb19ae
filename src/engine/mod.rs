pub mod directory;
pub mod proposals;
pub mod sessions;
pub mod voting;
