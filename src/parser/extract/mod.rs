pub mod details;
pub mod itemized;
pub mod summary;
