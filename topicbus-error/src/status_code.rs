use std::fmt;

/// Коды статуса для категоризации ошибок шины.
///
/// # Диапазоны:
/// - 2xxx: Ошибки входных данных (токены)
/// - 3xxx: Ошибки подписчиков
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 2xxx: Входные данные ===
    InvalidToken = 2001,

    // === 3xxx: Подписчики ===
    SubscriberFailed = 3000,
    SubscriberPanicked = 3001,
}

/// Уровень, на котором ошибка попадает в лог.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Рекомендуемый уровень логирования для данного кода.
    ///
    /// Ошибка, которую вернул обработчик, ожидаема и идёт в `warn`; паника
    /// подписчика идёт в `error`.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::InvalidToken => LogLevel::Info,
            Self::SubscriberFailed => LogLevel::Warn,
            Self::SubscriberPanicked => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
