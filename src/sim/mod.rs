pub mod event;
pub mod level;
pub mod library;
pub mod progression;
