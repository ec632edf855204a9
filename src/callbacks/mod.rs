pub mod expiry_callbacks;
