pub mod mapper;
pub mod migrations;
pub mod token;
pub mod user;
