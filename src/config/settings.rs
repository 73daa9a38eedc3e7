use config::{
    builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File, FileFormat,
};
use serde::{Deserialize, Serialize};

use crate::{logging::LoggingConfig, TopicRemoval};

/// Префикс переменных окружения.
pub const ENV_PREFIX: &str = "TOPICBUS";

/// Настройки экземпляра шины.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSettings {
    /// Ошибки подписчиков прерывают доставку и возвращаются вызывающему.
    #[serde(default)]
    pub immediate_exceptions: bool,
    /// Правило удаления подписок по топику.
    #[serde(default)]
    pub topic_removal: TopicRemoval,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bus: BusSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем переменные окружения
    /// вида `TOPICBUS_BUS__IMMEDIATE_EXCEPTIONS=true`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Загружает настройки из JSON-документа поверх значений по умолчанию.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Добавляем значения по умолчанию
            .set_default("bus.immediate_exceptions", false)?
            .set_default("bus.topic_removal", "raw_prefix")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?
            .set_default("logging.with_ansi", true)?
            .set_default("logging.with_target", true)
    }
}
