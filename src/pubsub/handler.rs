use std::{fmt, rc::Rc};

use crate::HandlerError;

/// Результат вызова обработчика.
pub type HandlerResult = Result<(), HandlerError>;

type Callback<T> = dyn Fn(&str, &T) -> HandlerResult;

/// Обработчик сообщений подписчика.
///
/// Получает исходный опубликованный топик (не усечённого предка, на который
/// оформлена подписка) и данные сообщения. Клон разделяет ту же функцию:
/// клоны одного обработчика равны друг другу, а два `Handler::new` над
/// одинаковыми замыканиями не равны. На этом равенстве построена отписка по
/// обработчику.
pub struct Handler<T> {
    callback: Rc<Callback<T>>,
}

impl<T> Handler<T> {
    /// Оборачивает замыкание, которое может вернуть ошибку.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &T) -> HandlerResult + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Оборачивает замыкание, которое не возвращает ошибок.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &T) + 'static,
    {
        Self::new(move |topic, data| {
            f(topic, data);
            Ok(())
        })
    }

    /// Вызывает обработчик.
    pub fn call(
        &self,
        topic: &str,
        data: &T,
    ) -> HandlerResult {
        (self.callback)(topic, data)
    }

    /// `true`, если оба значения ссылаются на одну и ту же функцию.
    pub fn same(
        &self,
        other: &Self,
    ) -> bool {
        // Сравниваются только адреса данных: vtable-указатели одного типа могут
        // различаться между единицами кодогенерации.
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Handler<T> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.same(other)
    }
}

impl<T> Eq for Handler<T> {}

impl<T> fmt::Debug for Handler<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Handler")
            .field("callback", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
