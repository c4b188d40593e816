pub mod dashboard;
pub mod health;
pub mod permissions;
pub mod persons;
pub mod roles;
