pub mod db_model;
pub mod queries;

pub use db_model::*;
