//! Иерархия топиков.
//!
//! Топик это строка, уровни которой разделены точкой: `"a.b.c"` является
//! потомком `"a.b"` и `"a"`. Содержимое не валидируется, пустая строка
//! тоже допустимый топик.

use std::iter::FusedIterator;

/// Разделитель уровней иерархии.
pub const SEPARATOR: char = '.';

/// Последовательность топиков доставки для опубликованного `topic`.
///
/// Начинается с самого `topic`, затем строка усекается по последней точке,
/// пока точки не закончатся: `"a.b.c"` → `"a.b.c"`, `"a.b"`, `"a"`.
/// Функция чисто структурная и не знает ничего о подписчиках.
pub fn match_sequence(topic: &str) -> MatchSequence<'_> {
    MatchSequence {
        next: Some(topic),
    }
}

/// Итератор, возвращаемый [`match_sequence`].
#[derive(Debug, Clone)]
pub struct MatchSequence<'a> {
    next: Option<&'a str>,
}

impl<'a> Iterator for MatchSequence<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.rfind(SEPARATOR).map(|pos| &current[..pos]);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self
            .next
            .map_or(0, |t| t.matches(SEPARATOR).count() + 1);
        (n, Some(n))
    }
}

impl ExactSizeIterator for MatchSequence<'_> {}

impl FusedIterator for MatchSequence<'_> {}

/// Проверяет, что `topic` равен `ancestor` или является его потомком по
/// иерархии (с учётом границы уровня).
pub fn is_within(
    topic: &str,
    ancestor: &str,
) -> bool {
    match topic.strip_prefix(ancestor) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("a.b.c", &["a.b.c", "a.b", "a"])]
    #[case("a", &["a"])]
    #[case("", &[""])]
    #[case("a.", &["a.", "a"])]
    #[case(".a", &[".a", ""])]
    #[case("a..b", &["a..b", "a.", "a"])]
    #[case("user.42.login", &["user.42.login", "user.42", "user"])]
    fn test_match_sequence(
        #[case] topic: &str,
        #[case] expected: &[&str],
    ) {
        let got: Vec<&str> = match_sequence(topic).collect();
        assert_eq!(got, expected);
    }

    /// Тест проверяет, что size_hint точно совпадает с длиной
    /// последовательности на каждом шаге.
    #[test]
    fn test_exact_size() {
        let mut seq = match_sequence("a.b.c.d");
        assert_eq!(seq.len(), 4);
        seq.next();
        assert_eq!(seq.len(), 3);
        seq.by_ref().for_each(drop);
        assert_eq!(seq.len(), 0);
        assert_eq!(seq.next(), None);
    }

    #[rstest]
    #[case("a.b", "a.b", true)]
    #[case("a.b.c", "a.b", true)]
    #[case("a.bc", "a.b", false)]
    #[case("a", "a.b", false)]
    #[case("anything", "", false)]
    #[case("", "", true)]
    fn test_is_within(
        #[case] topic: &str,
        #[case] ancestor: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_within(topic, ancestor), expected);
    }
}
