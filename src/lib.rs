pub mod auth;
pub mod broker;
pub mod cli;
pub mod config;
pub mod data_paths;
pub mod display;
pub mod ledger;
pub mod logging;
pub mod portfolio;
pub mod prices;
pub mod returns;
