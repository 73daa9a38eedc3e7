use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, error, info, warn};

use super::{
    delivery,
    handler::Handler,
    isolator::ExceptionMode,
    registry::{Registry, TopicRemoval},
    scheduler::Scheduler,
    token::Token,
};
use crate::{config::BusSettings, BusError, BusResult, ErrorExt, LogLevel};

/// Получатель ошибок подписчиков, перехваченных в отложенном режиме.
pub type ErrorSink = Rc<dyn Fn(&BusError)>;

/// Цель отписки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsubscribe<T> {
    /// Одна подписка по токену.
    ByToken(Token),
    /// Все подписки этого обработчика во всех топиках.
    ByCallback(Handler<T>),
    /// Топик и всё, что попадает под него по правилу удаления. Срабатывает,
    /// только если ключ топика существует.
    ByTopic(String),
}

impl<T> From<Token> for Unsubscribe<T> {
    fn from(token: Token) -> Self {
        Self::ByToken(token)
    }
}

impl<T> From<Handler<T>> for Unsubscribe<T> {
    fn from(handler: Handler<T>) -> Self {
        Self::ByCallback(handler)
    }
}

impl<T> From<&Handler<T>> for Unsubscribe<T> {
    fn from(handler: &Handler<T>) -> Self {
        Self::ByCallback(handler.clone())
    }
}

/// Результат отписки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsubscribed {
    /// Удалена подписка с этим токеном.
    Token(Token),
    /// Удалены подписки обработчика.
    Callback { removed: usize },
    /// Удалены ключи топиков.
    Topic { removed: usize },
    /// Ничего не найдено.
    NotFound,
}

impl Unsubscribed {
    pub fn is_removed(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// Общее состояние шины.
pub(crate) struct Shared<T> {
    pub(crate) registry: RefCell<Registry<T>>,
    pub(crate) scheduler: Scheduler,
    immediate: Cell<bool>,
    error_sink: RefCell<Option<ErrorSink>>,
}

impl<T: 'static> Shared<T> {
    pub(crate) fn new(
        removal: TopicRemoval,
        mode: ExceptionMode,
    ) -> Rc<Self> {
        Rc::new(Self {
            registry: RefCell::new(Registry::new(removal)),
            scheduler: Scheduler::new(),
            immediate: Cell::new(mode.is_immediate()),
            error_sink: RefCell::new(None),
        })
    }

    /// Ставит сообщение об ошибке подписчика на отдельный ход.
    pub(crate) fn defer_report(
        shared: &Rc<Self>,
        err: BusError,
    ) {
        let weak = Rc::downgrade(shared);
        shared.scheduler.defer(Box::new(move || {
            match weak.upgrade() {
                Some(shared) => shared.report(&err),
                None => log_failure(&err),
            }
            Ok(())
        }));
    }

    fn report(
        &self,
        err: &BusError,
    ) {
        log_failure(err);
        let sink = self.error_sink.borrow().clone();
        if let Some(sink) = sink {
            sink(err);
        }
    }
}

/// Логирует ошибку подписчика на уровне, заданном её кодом статуса.
fn log_failure(err: &BusError) {
    let topic = err.topic().unwrap_or_default();
    let token = err.token().unwrap_or_default();
    let status = err.status_code();
    let tags = err.metrics_tags();
    match status.log_level() {
        LogLevel::Error => error!(topic, token, %status, ?tags, error = %err, "subscriber failed"),
        LogLevel::Warn => warn!(topic, token, %status, ?tags, error = %err, "subscriber failed"),
        LogLevel::Info => info!(topic, token, %status, ?tags, error = %err, "subscriber failed"),
    }
}

/// Шина публикации/подписки с иерархическими топиками.
///
/// Однопоточная: клон разделяет то же состояние, поэтому обработчики могут
/// захватить шину и вызывать любые её операции во время доставки.
/// Чтобы не создавать цикл ссылок через реестр, обработчику лучше передавать
/// [`WeakBus`].
pub struct Bus<T> {
    shared: Rc<Shared<T>>,
}

impl<T: 'static> Bus<T> {
    /// Пустая шина с настройками по умолчанию.
    pub fn new() -> Self {
        Self::with_settings(&BusSettings::default())
    }

    pub fn with_settings(settings: &BusSettings) -> Self {
        Self {
            shared: Shared::new(
                settings.topic_removal,
                ExceptionMode::from_immediate(settings.immediate_exceptions),
            ),
        }
    }

    /// Подписывает обработчик на топик и возвращает новый уникальный токен.
    pub fn subscribe(
        &self,
        topic: &str,
        handler: Handler<T>,
    ) -> Token {
        let token = self.shared.registry.borrow_mut().insert(topic, handler);
        debug!(topic, %token, "subscribed");
        token
    }

    /// Подписывает замыкание без ошибок; см. [`Handler::from_fn`].
    pub fn subscribe_fn<F>(
        &self,
        topic: &str,
        f: F,
    ) -> Token
    where
        F: Fn(&str, &T) + 'static,
    {
        self.subscribe(topic, Handler::from_fn(f))
    }

    /// Отписка по явной цели.
    pub fn unsubscribe(
        &self,
        target: impl Into<Unsubscribe<T>>,
    ) -> Unsubscribed {
        let result = {
            let mut registry = self.shared.registry.borrow_mut();
            match target.into() {
                Unsubscribe::ByToken(token) => registry
                    .remove_token(token)
                    .map_or(Unsubscribed::NotFound, Unsubscribed::Token),
                Unsubscribe::ByCallback(handler) => match registry.remove_handler(&handler) {
                    0 => Unsubscribed::NotFound,
                    removed => Unsubscribed::Callback { removed },
                },
                Unsubscribe::ByTopic(topic) if registry.contains_topic(&topic) => {
                    Unsubscribed::Topic {
                        removed: registry.remove_topics(&topic),
                    }
                }
                Unsubscribe::ByTopic(_) => Unsubscribed::NotFound,
            }
        };
        debug!(?result, "unsubscribe");
        result
    }

    /// Классифицирует строку: существующий ключ топика означает удаление по топику,
    /// иначе строка трактуется как токен.
    ///
    /// Возвращает `None`, если строка не является ни ключом, ни токеном.
    pub fn classify(
        &self,
        value: &str,
    ) -> Option<Unsubscribe<T>> {
        if self.shared.registry.borrow().contains_topic(value) {
            return Some(Unsubscribe::ByTopic(value.to_owned()));
        }
        value.parse().ok().map(Unsubscribe::ByToken)
    }

    /// Отписка по строке: топик или токен, см. [`Bus::classify`].
    pub fn unsubscribe_str(
        &self,
        value: &str,
    ) -> Unsubscribed {
        match self.classify(value) {
            Some(target) => self.unsubscribe(target),
            None => {
                debug!(value, "unsubscribe target is neither a topic nor a token");
                Unsubscribed::NotFound
            }
        }
    }

    /// Отложенная публикация.
    ///
    /// Возвращает `false` и ничего не планирует, если в момент вызова ни у
    /// топика, ни у его предков нет подписчиков. Иначе ставит проход доставки
    /// в очередь и сразу возвращает `true`; подписчики вызываются при
    /// следующем [`Bus::run_pending`] или внутри [`Bus::run`].
    pub fn publish(
        &self,
        topic: &str,
        data: T,
    ) -> bool {
        if !self.has_subscribers(topic) {
            debug!(topic, "publish skipped: no subscribers");
            return false;
        }

        let mode = self.exception_mode();
        let weak = Rc::downgrade(&self.shared);
        let owned = topic.to_owned();
        self.shared.scheduler.defer(Box::new(move || match weak.upgrade() {
            Some(shared) => delivery::deliver(&shared, &owned, &data, mode).map(drop),
            None => Ok(()),
        }));
        debug!(topic, "publish scheduled");
        true
    }

    /// Синхронная публикация: доставка выполняется до возврата.
    ///
    /// `Ok(false)`: подписчиков не было. В немедленном режиме ошибка
    /// обработчика прерывает доставку и возвращается как `Err`.
    pub fn publish_sync(
        &self,
        topic: &str,
        data: T,
    ) -> BusResult<bool> {
        if !self.has_subscribers(topic) {
            debug!(topic, "publish_sync skipped: no subscribers");
            return Ok(false);
        }
        delivery::deliver(&self.shared, topic, &data, self.exception_mode())?;
        Ok(true)
    }

    /// Удаляет все топики, попадающие под `prefix`, по правилу удаления шины.
    pub fn clear_subscriptions(
        &self,
        prefix: &str,
    ) {
        let removed = self.shared.registry.borrow_mut().remove_topics(prefix);
        debug!(prefix, removed, "subscriptions cleared");
    }

    /// Полностью очищает реестр. Выданные токены не переиспользуются.
    pub fn clear_all_subscriptions(&self) {
        self.shared.registry.borrow_mut().clear();
        debug!("all subscriptions cleared");
    }

    pub fn set_immediate_exceptions(
        &self,
        immediate: bool,
    ) {
        self.shared.immediate.set(immediate);
    }

    pub fn immediate_exceptions(&self) -> bool {
        self.shared.immediate.get()
    }

    pub fn exception_mode(&self) -> ExceptionMode {
        ExceptionMode::from_immediate(self.immediate_exceptions())
    }

    /// Устанавливает получателя ошибок, перехваченных в отложенном режиме.
    pub fn set_error_sink<F>(
        &self,
        sink: F,
    ) where
        F: Fn(&BusError) + 'static,
    {
        *self.shared.error_sink.borrow_mut() = Some(Rc::new(sink));
    }

    pub fn clear_error_sink(&self) {
        self.shared.error_sink.borrow_mut().take();
    }

    /// Выполняет все отложенные ходы, включая поставленные во время выполнения.
    ///
    /// Возвращает число выполненных ходов. Повторный вход из обработчика
    /// возвращает `Ok(0)`. Ошибка хода возвращается, а оставшиеся ходы ждут
    /// следующего вызова.
    pub fn run_pending(&self) -> BusResult<usize> {
        self.shared.scheduler.run_pending()
    }

    /// Бесконечно выполняет отложенные ходы, уступая управление между ними.
    /// Ошибки ходов логируются.
    pub async fn run(&self) {
        self.shared.scheduler.run().await
    }

    pub fn pending_turns(&self) -> usize {
        self.shared.scheduler.pending()
    }

    /// Есть ли подписчик у топика или у любого его предка.
    pub fn has_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.shared.registry.borrow().has_any_subscriber(topic)
    }

    pub fn contains_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.shared.registry.borrow().contains_topic(topic)
    }

    pub fn subscription_count(&self) -> usize {
        self.shared.registry.borrow().subscription_count()
    }

    /// Отсортированный список ключей топиков, включая пустые.
    pub fn topics(&self) -> Vec<String> {
        self.shared.registry.borrow().topics()
    }

    pub fn topic_removal(&self) -> TopicRemoval {
        self.shared.registry.borrow().removal()
    }

    pub fn downgrade(&self) -> WeakBus<T> {
        WeakBus {
            shared: Rc::downgrade(&self.shared),
        }
    }
}

impl<T: 'static> Default for Bus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Bus<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Bus")
            .field("immediate_exceptions", &self.shared.immediate.get())
            .field("pending_turns", &self.shared.scheduler.pending())
            .finish_non_exhaustive()
    }
}

/// Слабая ссылка на шину.
pub struct WeakBus<T> {
    shared: Weak<Shared<T>>,
}

impl<T> WeakBus<T> {
    pub fn upgrade(&self) -> Option<Bus<T>> {
        self.shared.upgrade().map(|shared| Bus { shared })
    }
}

impl<T> Clone for WeakBus<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}
