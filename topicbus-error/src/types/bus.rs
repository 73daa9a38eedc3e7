use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка, которую возвращает обработчик подписчика.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ошибки шины сообщений.
#[derive(Debug, Error)]
pub enum BusError {
    /// Обработчик вернул `Err` во время доставки.
    #[error("subscriber {token} failed on '{matched}' while handling '{topic}': {source}")]
    Subscriber {
        /// Исходный опубликованный топик.
        topic: String,
        /// Топик (предок или сам топик), на котором зарегистрирован подписчик.
        matched: String,
        token: String,
        #[source]
        source: HandlerError,
    },

    /// Обработчик запаниковал во время доставки в отложенном режиме.
    #[error("subscriber {token} panicked on '{matched}' while handling '{topic}': {message}")]
    SubscriberPanicked {
        topic: String,
        matched: String,
        token: String,
        message: String,
    },

    /// Строка не является токеном подписки вида `uid_<n>`.
    #[error("invalid subscription token '{value}'")]
    InvalidToken { value: String },
}

impl BusError {
    /// Опубликованный топик, во время доставки которого произошла ошибка.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Subscriber { topic, .. } | Self::SubscriberPanicked { topic, .. } => Some(topic),
            Self::InvalidToken { .. } => None,
        }
    }

    /// Токен подписчика, вызвавшего ошибку.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Subscriber { token, .. } | Self::SubscriberPanicked { token, .. } => Some(token),
            Self::InvalidToken { .. } => None,
        }
    }
}

impl ErrorExt for BusError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Subscriber { .. } => StatusCode::SubscriberFailed,
            Self::SubscriberPanicked { .. } => StatusCode::SubscriberPanicked,
            Self::InvalidToken { .. } => StatusCode::InvalidToken,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Subscriber { topic, .. } => format!("Subscriber failed on '{topic}'"),
            Self::SubscriberPanicked { topic, .. } => format!("Subscriber panicked on '{topic}'"),
            Self::InvalidToken { value } => format!("Invalid token: {value}"),
        }
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![("status_code", self.status_code().code().to_string())];

        match self {
            Self::Subscriber { matched, .. } | Self::SubscriberPanicked { matched, .. } => {
                tags.push(("matched", matched.clone()));
            }
            Self::InvalidToken { value } => tags.push(("value", value.clone())),
        }

        tags
    }
}
