pub mod derived;
pub mod draft;
pub mod summary;
pub mod validation;
