//! Подсистема Publish–Subscribe (pub/sub).
//!
//! Внутрипроцессная диспетчеризация сообщений с иерархическими топиками:
//! подписчик топика `"a"` получает всё, что публикуется в `"a"`, `"a.b"`,
//! `"a.b.c"` и т.д.
//!
//! - `topic`: вычисление последовательности топиков доставки.
//! - `token`: уникальные токены подписок.
//! - `handler`: обработчики подписчиков с идентичностью для отписки.
//! - `registry`: реестр подписок и правила удаления.
//! - `isolator`: изоляция ошибок подписчиков.
//! - `delivery` (приватный): проход доставки одного сообщения.
//! - `scheduler`: очередь отложенных ходов.
//! - `bus`: публичный API шины.
//! - `global`: шина по умолчанию для текущего потока.

pub mod bus;
mod delivery;
pub mod global;
pub mod handler;
pub mod isolator;
pub mod registry;
mod scheduler;
pub mod token;
pub mod topic;

// Публичный экспорт основных типов, чтобы упростить доступ к ним из
// внешнего кода.
pub use bus::*;
pub use handler::*;
pub use isolator::ExceptionMode;
pub use registry::TopicRemoval;
pub use token::Token;
pub use topic::{match_sequence, MatchSequence};
