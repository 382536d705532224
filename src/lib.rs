//! Habit, todo, reminder and calendar bookkeeping backed by a local SQLite store.

pub mod api;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod dates;
pub mod db;
pub mod habits;
pub mod model;
pub mod service;
