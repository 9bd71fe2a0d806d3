pub mod auth;
pub mod categories;
pub mod courses;
pub mod files;
pub mod gigs;
pub mod notifications;
pub mod payments;
pub mod users;
