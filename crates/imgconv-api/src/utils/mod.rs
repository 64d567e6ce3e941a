pub mod naming;
pub mod upload;
