pub mod allocator;
pub mod fields;
pub mod pdf;
pub mod table;
pub mod workdays;
