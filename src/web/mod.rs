// src/web/mod.rs
pub mod auth_handlers;
pub mod class_handlers;
pub mod dashboard_handlers;
pub mod feedback;
pub mod invite_handlers;
pub mod mw_auth;
pub mod mw_role;
pub mod mw_sync;
pub mod routes;
pub mod school_handlers;
