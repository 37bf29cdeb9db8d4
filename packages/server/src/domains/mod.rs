// Domain modules - business logic organized by bounded context

pub mod auth;
pub mod cart;
pub mod users;
