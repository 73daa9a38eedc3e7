//! Изоляция ошибок подписчиков.
//!
//! В немедленном режиме ошибка обработчика прерывает проход доставки и
//! поднимается к вызывающему. В отложенном режиме (по умолчанию) ошибка и
//! паника перехватываются, передаются в `defer` для сообщения на отдельном
//! ходе, а доставка остальным подписчикам продолжается.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use serde::{Deserialize, Serialize};

use super::{handler::Handler, token::Token};
use crate::{BusError, BusResult};

/// Режим обработки ошибок подписчиков.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionMode {
    /// Ошибка прерывает доставку и возвращается вызывающему.
    Immediate,
    /// Ошибка перехватывается и сообщается позже, доставка продолжается.
    #[default]
    Deferred,
}

impl ExceptionMode {
    pub fn from_immediate(immediate: bool) -> Self {
        if immediate {
            Self::Immediate
        } else {
            Self::Deferred
        }
    }

    pub fn is_immediate(self) -> bool {
        self == Self::Immediate
    }
}

/// Контекст одного вызова обработчика.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Call<'a> {
    /// Опубликованный топик.
    pub topic: &'a str,
    /// Уровень иерархии, на котором найден подписчик.
    pub matched: &'a str,
    pub token: Token,
}

impl Call<'_> {
    fn failed(
        &self,
        source: crate::HandlerError,
    ) -> BusError {
        BusError::Subscriber {
            topic: self.topic.to_owned(),
            matched: self.matched.to_owned(),
            token: self.token.to_string(),
            source,
        }
    }

    fn panicked(
        &self,
        payload: Box<dyn Any + Send>,
    ) -> BusError {
        BusError::SubscriberPanicked {
            topic: self.topic.to_owned(),
            matched: self.matched.to_owned(),
            token: self.token.to_string(),
            message: panic_message(payload.as_ref()),
        }
    }
}

/// Вызывает обработчик по правилам `mode`.
///
/// Возвращает `Err` только в немедленном режиме. Паника в немедленном режиме
/// не перехватывается и раскручивает стек вызывающего.
pub(crate) fn invoke<T, D>(
    mode: ExceptionMode,
    handler: &Handler<T>,
    call: &Call<'_>,
    data: &T,
    defer: D,
) -> BusResult<()>
where
    D: FnOnce(BusError),
{
    match mode {
        ExceptionMode::Immediate => handler
            .call(call.topic, data)
            .map_err(|source| call.failed(source)),
        ExceptionMode::Deferred => {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.call(call.topic, data)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(source)) => defer(call.failed(source)),
                Err(payload) => defer(call.panicked(payload)),
            }
            Ok(())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
