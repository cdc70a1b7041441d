pub mod dom;
pub mod locator;
pub mod table;
