pub mod jdk_service;

pub use jdk_service::*;
