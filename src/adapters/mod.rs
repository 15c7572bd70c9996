pub mod backup;
pub mod env;
pub mod link;
pub mod persistence;
pub mod validator;
