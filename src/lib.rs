pub mod config;
pub mod grid;
pub mod hotels;
pub mod output;
pub mod rates;
