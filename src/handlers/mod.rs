pub mod auth;
pub mod imports;
pub mod jobs;
pub mod mileage_rates;
pub mod pay_periods;
pub mod reports;
pub mod shared;
pub mod technicians;
pub mod time_entries;
