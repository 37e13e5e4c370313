pub mod admin;
pub mod app;
pub mod health;
pub mod metrics;
pub mod ops;
pub mod pages;
pub mod www;
