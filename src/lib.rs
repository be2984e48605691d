#![doc = "The `devboard` library crate."]
#![doc = ""]
#![doc = "Job board backend connecting developers and employers: accounts, bearer-token"]
#![doc = "authentication, tasks, reactions, skills and achievements. The binary"]
#![doc = "(`main.rs`) wires these modules to a Postgres-backed store and serves them."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use crate::error::AppError;
