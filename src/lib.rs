//! Menu catalog service: REST API over menus, submenus and dishes, a read-through
//! cache, and a scheduled reconciler that mirrors a spreadsheet feed into the store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
