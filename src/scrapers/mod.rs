pub mod base;
pub mod kabutan;
