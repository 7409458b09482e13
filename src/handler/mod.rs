pub mod auth;
pub mod bids;
pub mod messages;
pub mod projects;
pub mod ratings;
pub mod users;
