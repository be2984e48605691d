pub mod achievements;
pub mod catalog;
