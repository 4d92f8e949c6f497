//! Credit Application API Library
//!
//! Customer registration and credit proposals over a REST API: request
//! validation, the customer and credit services, and their PostgreSQL and
//! in-memory storage.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `data`: Data access layer.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: PostgreSQL repositories.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `memory_storage`: In-memory repositories.
//! - `models`: Domain entities, request payloads and response views.
//! - `openapi`: OpenAPI document.
//! - `repository`: Storage contracts.
//! - `routes`: Router assembly.
//! - `services`: Customer and credit services.
//! - `validation`: Request field validation.

pub mod api;
pub mod core;
pub mod data;

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod memory_storage;
pub mod models;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod validation;
