pub mod cleanup;
pub mod error;
pub mod repositories;
pub mod services;
