pub mod controllers;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod repositories;
pub mod routes;
pub mod state;
