pub mod driver;
pub mod location;
pub mod package;
pub mod proof;
pub mod tracking;
