//! Startup Organizer - startups, their tags, news links and blog posts
//!
//! This library provides the core functionality behind the `organizer`
//! server: storage, validation, services and the HTML pages.

pub mod api;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod theme;
