// src/services/mod.rs
pub mod attendance_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod data_service;
pub mod seed_service;
pub mod session_service;
pub mod sync_service;
