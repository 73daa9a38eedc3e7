//! Реестр подписок.
//!
//! Хранит отображение `топик → (токен → обработчик)`. Ключ топика может
//! существовать без единой подписки (после поштучной отписки), это
//! допустимое состояние, и удаление по топику проверяет именно наличие ключа,
//! а не его непустоту.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{
    handler::Handler,
    token::{Token, TokenCounter},
    topic,
};

/// Правило сопоставления при удалении подписок по топику.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicRemoval {
    /// Удаляются все топики, строка которых начинается с префикса.
    /// `"a.b"` удаляет и `"a.bc"`.
    #[default]
    RawPrefix,
    /// Удаляются сам топик и его потомки по иерархии (`"a.b"`, `"a.b.*"`).
    Hierarchical,
}

impl TopicRemoval {
    /// Попадает ли `topic` под удаление по `prefix`.
    pub fn matches(
        self,
        topic: &str,
        prefix: &str,
    ) -> bool {
        match self {
            Self::RawPrefix => topic.starts_with(prefix),
            Self::Hierarchical => topic::is_within(topic, prefix),
        }
    }
}

/// Подписчики одного топика в порядке выдачи токенов.
type Subscribers<T> = BTreeMap<u64, Handler<T>>;

/// Реестр подписок шины.
pub(crate) struct Registry<T> {
    topics: FxHashMap<String, Subscribers<T>>,
    tokens: TokenCounter,
    removal: TopicRemoval,
}

impl<T> Registry<T> {
    pub fn new(removal: TopicRemoval) -> Self {
        Self {
            topics: FxHashMap::default(),
            tokens: TokenCounter::default(),
            removal,
        }
    }

    /// Регистрирует обработчик на топик и выдаёт новый токен.
    ///
    /// Ключ топика создаётся, если его ещё нет.
    pub fn insert(
        &mut self,
        topic: &str,
        handler: Handler<T>,
    ) -> Token {
        let token = self.tokens.issue();
        self.topics
            .entry(topic.to_owned())
            .or_default()
            .insert(token.id(), handler);
        token
    }

    /// Удаляет единственную подписку с данным токеном.
    ///
    /// Токены уникальны, поэтому поиск останавливается на первом совпадении.
    pub fn remove_token(
        &mut self,
        token: Token,
    ) -> Option<Token> {
        self.topics
            .values_mut()
            .find_map(|subs| subs.remove(&token.id()))
            .map(|_| token)
    }

    /// Удаляет все подписки с этим обработчиком во всех топиках.
    ///
    /// Возвращает количество удалённых подписок.
    pub fn remove_handler(
        &mut self,
        handler: &Handler<T>,
    ) -> usize {
        let mut removed = 0;
        for subs in self.topics.values_mut() {
            let before = subs.len();
            subs.retain(|_, h| !h.same(handler));
            removed += before - subs.len();
        }
        removed
    }

    /// Удаляет ключи топиков, попадающих под `prefix` по правилу реестра,
    /// вместе со всеми их подписками.
    ///
    /// Возвращает количество удалённых ключей.
    pub fn remove_topics(
        &mut self,
        prefix: &str,
    ) -> usize {
        let removal = self.removal;
        let before = self.topics.len();
        self.topics
            .retain(|topic, _| !removal.matches(topic, prefix));
        before - self.topics.len()
    }

    /// Полностью очищает реестр. Счётчик токенов не сбрасывается.
    pub fn clear(&mut self) {
        self.topics.clear();
    }

    /// Есть ли ключ топика (возможно, без подписок).
    pub fn contains_topic(
        &self,
        topic: &str,
    ) -> bool {
        self.topics.contains_key(topic)
    }

    /// Есть ли у самого `topic` хотя бы одна подписка.
    pub fn has_direct_subscribers(
        &self,
        topic: &str,
    ) -> bool {
        self.topics
            .get(topic)
            .is_some_and(|subs| !subs.is_empty())
    }

    /// Есть ли подписчик у `topic` или у любого его предка.
    ///
    /// Останавливается на первом непустом уровне.
    pub fn has_any_subscriber(
        &self,
        topic: &str,
    ) -> bool {
        topic::match_sequence(topic).any(|t| self.has_direct_subscribers(t))
    }

    /// Токены подписок `topic`, выданные строго до `watermark`, по порядку.
    pub fn tokens_before(
        &self,
        topic: &str,
        watermark: u64,
    ) -> Vec<Token> {
        self.topics
            .get(topic)
            .map(|subs| {
                subs.range(..watermark)
                    .map(|(id, _)| Token::new(*id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Обработчик подписки, если она всё ещё жива.
    pub fn handler(
        &self,
        topic: &str,
        token: Token,
    ) -> Option<Handler<T>> {
        self.topics.get(topic)?.get(&token.id()).cloned()
    }

    /// Отметка счётчика токенов: все выданные токены меньше неё.
    pub fn watermark(&self) -> u64 {
        self.tokens.watermark()
    }

    /// Общее число живых подписок.
    pub fn subscription_count(&self) -> usize {
        self.topics.values().map(BTreeMap::len).sum()
    }

    /// Отсортированный список ключей топиков, включая пустые.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.keys().cloned().collect();
        topics.sort_unstable();
        topics
    }

    pub fn removal(&self) -> TopicRemoval {
        self.removal
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new(TopicRemoval::default())
    }
}
