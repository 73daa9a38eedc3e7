//! Конфигурация шины и процесса.

pub mod settings;

pub use settings::{BusSettings, Settings};
