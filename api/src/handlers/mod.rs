pub mod library;
pub mod scan;
pub mod system;
