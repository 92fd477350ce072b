pub mod error;
pub mod member;
pub mod pagination;
pub mod repository;
