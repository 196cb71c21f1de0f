pub mod health;
pub mod objects;
pub mod upload_request;
