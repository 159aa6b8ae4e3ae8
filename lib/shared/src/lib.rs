pub mod library;
pub mod media;
pub mod scan;
pub mod system;
