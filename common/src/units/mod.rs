pub mod size_unit;
pub mod time_unit;

pub use size_unit::SizeUnit;
pub use time_unit::TimeUnit;
