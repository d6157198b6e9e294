//! Weekly archive of the OCHA "Reported impact snapshot | Gaza Strip"
//! fatality figures, with a job that commits the refreshed data and chart
//! back to the repository.

pub mod db;
pub mod job;
pub mod utils;
