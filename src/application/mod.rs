//! Application services: catalog CRUD, feed reconciliation and the jobs that drive it.

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod pagination;
pub mod repos;
pub mod sync;
