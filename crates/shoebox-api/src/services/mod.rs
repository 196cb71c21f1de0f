//! Coordinator business logic, independent of HTTP

pub mod coordinator;
