use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::BusError;

/// Префикс строкового представления токена.
const TOKEN_PREFIX: &str = "uid_";

/// Уникальный идентификатор подписки.
///
/// Выдаётся один раз на каждую успешную подписку. Номера растут монотонно и
/// никогда не переиспользуются в пределах жизни шины, поэтому порядок токенов
/// совпадает с порядком подписок. Строковая форма: `uid_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(u64);

impl Token {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Порядковый номер токена.
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}{}", self.0)
    }
}

impl FromStr for Token {
    type Err = BusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(TOKEN_PREFIX)
            .filter(|digits| is_canonical_number(digits))
            .and_then(|digits| digits.parse().ok())
            .map(Token)
            .ok_or_else(|| BusError::InvalidToken {
                value: s.to_string(),
            })
    }
}

/// Десятичная запись без знака и ведущих нулей: у каждого номера ровно одна
/// строковая форма.
fn is_canonical_number(digits: &str) -> bool {
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

impl TryFrom<String> for Token {
    type Error = BusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

/// Счётчик токенов. Продвигается только при успешной подписке.
#[derive(Debug, Default)]
pub(crate) struct TokenCounter {
    next: u64,
}

impl TokenCounter {
    /// Выдаёт следующий токен: первым будет `uid_0`.
    pub(crate) fn issue(&mut self) -> Token {
        let token = Token(self.next);
        self.next += 1;
        token
    }

    /// Номер, который получит следующий выданный токен.
    ///
    /// Все уже выданные токены строго меньше этой отметки.
    pub(crate) fn watermark(&self) -> u64 {
        self.next
    }
}
