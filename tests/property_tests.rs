//! Property-based тесты иерархии топиков и реестра подписок.
//!
//! Топики генерируются из маленького алфавита, чтобы случайные подписки и
//! публикации часто пересекались по уровням.

use std::{cell::Cell, rc::Rc};

use proptest::prelude::*;
use topicbus::{match_sequence, Bus, Handler, Token};

const PROPTEST_CASES: u32 = 256;

/// Топик из 0..4 уровней, каждый уровень из `a`/`b` или пустой.
fn topic_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just(""), Just("a"), Just("b"), Just("ab")], 0..4)
        .prop_map(|levels| levels.join("."))
}

#[derive(Debug, Clone)]
enum Op {
    Subscribe(String),
    UnsubscribeNth(usize),
    ClearAll,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => topic_strategy().prop_map(Op::Subscribe),
        2 => any::<usize>().prop_map(Op::UnsubscribeNth),
        1 => Just(Op::ClearAll),
    ]
}

/// Модель: есть ли подписчик у топика или у кого-то из его предков.
fn model_has_subscriber(
    live: &[(Token, String)],
    topic: &str,
) -> bool {
    match_sequence(topic).any(|level| live.iter().any(|(_, t)| t == level))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: PROPTEST_CASES,
        ..ProptestConfig::default()
    })]

    /// Последовательность начинается с самого топика, каждый следующий
    /// элемент получается из предыдущего отсечением последнего уровня, а
    /// длина равна числу точек плюс один.
    #[test]
    fn prop_match_sequence_structure(topic in "[a-c.]{0,12}") {
        let seq: Vec<&str> = match_sequence(&topic).collect();

        prop_assert_eq!(seq.len(), topic.matches('.').count() + 1);
        prop_assert_eq!(match_sequence(&topic).len(), seq.len());
        prop_assert_eq!(seq[0], topic.as_str());
        for pair in seq.windows(2) {
            prop_assert!(pair[0].starts_with(pair[1]));
            prop_assert_eq!(&pair[0][pair[1].len()..pair[1].len() + 1], ".");
        }
        prop_assert!(!seq[seq.len() - 1].contains('.'));
    }

    /// Результат публикации совпадает с моделью, а число вызовов равно числу
    /// живых подписок на совпавших уровнях.
    #[test]
    fn prop_publish_matches_model(
        ops in prop::collection::vec(op_strategy(), 0..24),
        published in topic_strategy(),
    ) {
        let bus: Bus<u8> = Bus::new();
        let calls = Rc::new(Cell::new(0usize));
        let c = Rc::clone(&calls);
        let handler = Handler::from_fn(move |_, _: &u8| c.set(c.get() + 1));

        let mut live: Vec<(Token, String)> = Vec::new();
        for op in ops {
            match op {
                Op::Subscribe(topic) => {
                    let token = bus.subscribe(&topic, handler.clone());
                    live.push((token, topic));
                }
                Op::UnsubscribeNth(n) if !live.is_empty() => {
                    let (token, _) = live.remove(n % live.len());
                    prop_assert!(bus.unsubscribe(token).is_removed());
                }
                Op::UnsubscribeNth(_) => {}
                Op::ClearAll => {
                    bus.clear_all_subscriptions();
                    live.clear();
                }
            }
        }

        let expected = model_has_subscriber(&live, &published);
        prop_assert_eq!(bus.has_subscribers(&published), expected);
        prop_assert_eq!(bus.publish_sync(&published, 0).unwrap(), expected);

        let expected_calls = match_sequence(&published)
            .map(|level| live.iter().filter(|(_, t)| t == level).count())
            .sum::<usize>();
        prop_assert_eq!(calls.get(), expected_calls);
    }

    /// Токены никогда не повторяются, в том числе после полной очистки.
    #[test]
    fn prop_tokens_never_repeat(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let bus: Bus<()> = Bus::new();
        let mut issued: Vec<Token> = Vec::new();
        for op in ops {
            match op {
                Op::Subscribe(topic) => issued.push(bus.subscribe_fn(&topic, |_, _| {})),
                Op::ClearAll => bus.clear_all_subscriptions(),
                Op::UnsubscribeNth(_) => {}
            }
        }
        prop_assert!(issued.windows(2).all(|w| w[0] < w[1]));
    }

    /// Разбор произвольной строки как токена не паникует и принимает ровно
    /// строки вида `uid_<число>` без ведущих нулей, то есть те, что совпадают
    /// со строковой формой полученного токена.
    #[test]
    fn prop_token_parse_is_total(value in "(uid_)?[0-9a-z_]{0,8}") {
        let digits = value
            .strip_prefix("uid_")
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .filter(|d| *d == "0" || !d.starts_with('0'));
        match (value.parse::<Token>(), digits) {
            (Ok(token), Some(d)) => {
                prop_assert_eq!(token.id(), d.parse::<u64>().unwrap());
                prop_assert_eq!(token.to_string(), value);
            }
            (Err(_), None) => {}
            (parsed, _) => prop_assert!(false, "unexpected parse result {:?} for {:?}", parsed, value),
        }
    }
}
