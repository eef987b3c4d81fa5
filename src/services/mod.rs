pub mod cache;
pub mod forecast;
pub mod insights;
pub mod owm;
