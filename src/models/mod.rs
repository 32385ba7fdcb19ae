pub mod proposal;
pub mod response;
pub mod user;
