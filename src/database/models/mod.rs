pub mod activity;
pub mod job;
pub(crate) mod macros;
pub mod mileage;
pub mod pay_period;
pub mod platform;
pub mod technician;
pub mod time_entry;
pub mod user;

// Re-export all models for easy importing
pub use activity::*;
pub use job::*;
pub use mileage::*;
pub use pay_period::*;
pub use platform::*;
pub use technician::*;
pub use time_entry::*;
pub use user::*;
