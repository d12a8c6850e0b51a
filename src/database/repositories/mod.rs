pub mod activity;
pub mod job;
pub mod mileage_rate;
pub mod pay_period;
pub mod platform;
pub mod technician;
pub mod time_entry;
pub mod user;

// Re-export all repositories for easy importing
pub use activity::ActivityRepository;
pub use job::JobRepository;
pub use mileage_rate::MileageRateRepository;
pub use pay_period::PayPeriodRepository;
pub use platform::PlatformRepository;
pub use technician::TechnicianRepository;
pub use time_entry::TimeEntryRepository;
pub use user::UserRepository;
