pub mod address;
pub mod application;
pub mod job;
pub mod review;
pub mod user;
