pub mod auth;
pub mod config;
pub mod gmail;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod openapi_config;
pub mod repositories;
pub mod scheduler;
pub mod services;
