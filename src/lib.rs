pub mod api_router;
pub mod auth;
pub mod config;
pub mod customers;
pub mod dashboards;
pub mod pricing;
pub mod quotes;
pub mod settings;
pub mod shared;
