//! Проход доставки одного опубликованного сообщения.

use std::rc::Rc;

use tracing::{debug, trace};

use super::{
    bus::Shared,
    isolator::{self, Call, ExceptionMode},
    topic,
};
use crate::BusResult;

/// Доставляет `data` подписчикам `topic` и всех его предков.
///
/// Записи реестра читаются в момент обхода каждого уровня, а каждая подписка
/// перечитывается непосредственно перед вызовом: удалённая обработчиком
/// подписка, до которой очередь ещё не дошла, вызвана не будет. Подписки,
/// оформленные после начала прохода, в нём не участвуют ни на одном уровне.
///
/// Обработчик всегда получает исходный `topic`, а не усечённого предка.
/// Возвращает число вызванных обработчиков.
pub(crate) fn deliver<T: 'static>(
    shared: &Rc<Shared<T>>,
    topic: &str,
    data: &T,
    mode: ExceptionMode,
) -> BusResult<usize> {
    let watermark = shared.registry.borrow().watermark();
    let mut invoked = 0;

    for matched in topic::match_sequence(topic) {
        let tokens = shared.registry.borrow().tokens_before(matched, watermark);

        for token in tokens {
            let Some(handler) = shared.registry.borrow().handler(matched, token) else {
                trace!(topic, matched, %token, "subscription removed during delivery");
                continue;
            };

            trace!(topic, matched, %token, "invoking subscriber");
            let call = Call {
                topic,
                matched,
                token,
            };
            isolator::invoke(mode, &handler, &call, data, |err| {
                Shared::defer_report(shared, err)
            })?;
            invoked += 1;
        }
    }

    debug!(topic, invoked, immediate = mode.is_immediate(), "delivery pass finished");
    Ok(invoked)
}
