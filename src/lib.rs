pub mod admin;
pub mod api_router;
pub mod auth;
pub mod catalog;
pub mod contact;
pub mod core;
pub mod learn;
pub mod main_module;
pub mod security;
pub mod site_content;
