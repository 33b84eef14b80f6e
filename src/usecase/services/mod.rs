pub mod export_service;
pub mod query_controller;
pub mod view_service;
