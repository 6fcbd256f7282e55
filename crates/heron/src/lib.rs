pub mod agent;
pub mod chat;
pub mod errors;
pub mod models;
pub mod providers;
pub mod registry;
pub mod search;
pub mod toolkit;
