//! Шина по умолчанию.
//!
//! Каждый поток получает собственный экземпляр [`Bus`] с полезной нагрузкой
//! `serde_json::Value`; функции модуля являются тонкими обёртками над ним. Для тестов и
//! нескольких независимых шин создавайте [`Bus`] явно.

use serde_json::Value;

use super::{
    bus::{Bus, Unsubscribe, Unsubscribed},
    handler::Handler,
    token::Token,
};
use crate::BusResult;

thread_local! {
    static DEFAULT_BUS: Bus<Value> = Bus::new();
}

/// Выполняет `f` с шиной текущего потока.
pub fn with_default<R>(f: impl FnOnce(&Bus<Value>) -> R) -> R {
    DEFAULT_BUS.with(f)
}

/// Клон шины текущего потока.
pub fn default_bus() -> Bus<Value> {
    with_default(Bus::clone)
}

pub fn subscribe(
    topic: &str,
    handler: Handler<Value>,
) -> Token {
    with_default(|bus| bus.subscribe(topic, handler))
}

pub fn unsubscribe(target: impl Into<Unsubscribe<Value>>) -> Unsubscribed {
    with_default(|bus| bus.unsubscribe(target))
}

pub fn unsubscribe_str(value: &str) -> Unsubscribed {
    with_default(|bus| bus.unsubscribe_str(value))
}

pub fn publish(
    topic: &str,
    data: Value,
) -> bool {
    with_default(|bus| bus.publish(topic, data))
}

pub fn publish_sync(
    topic: &str,
    data: Value,
) -> BusResult<bool> {
    with_default(|bus| bus.publish_sync(topic, data))
}

pub fn clear_subscriptions(prefix: &str) {
    with_default(|bus| bus.clear_subscriptions(prefix))
}

pub fn clear_all_subscriptions() {
    with_default(Bus::clear_all_subscriptions)
}

pub fn set_immediate_exceptions(immediate: bool) {
    with_default(|bus| bus.set_immediate_exceptions(immediate))
}

pub fn immediate_exceptions() -> bool {
    with_default(Bus::immediate_exceptions)
}

pub fn run_pending() -> BusResult<usize> {
    with_default(Bus::run_pending)
}
