use std::error::Error;

use crate::StatusCode;

/// Расширение ошибок шины для логирования и вывода пользователю.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки.
    fn status_code(&self) -> StatusCode;

    /// Короткое сообщение для внешнего потребителя, без источника ошибки.
    fn client_message(&self) -> String {
        self.to_string()
    }

    /// Поля, которые прикладываются к событию лога об этой ошибке.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![("status_code", self.status_code().code().to_string())]
    }
}
