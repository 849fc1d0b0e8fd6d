pub mod jwt;
pub mod options;
