// Domain rules
pub mod access;
pub mod expiry;
pub mod health;
pub mod metrics;
pub mod subscription;

// Service plumbing
pub mod callbacks;
pub mod config;
pub mod db;
pub mod handlers;
pub mod router;
pub mod worker;
