//! Очередь отложенных ходов.
//!
//! Отложенная доставка и отложенные сообщения об ошибках ставятся в FIFO
//! очередь и выполняются позже, на отдельном ходе. Постановка в очередь
//! работает по принципу fire-and-forget: отменить поставленный ход нельзя.

use std::cell::Cell;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, trace, warn};

use crate::BusResult;

/// Один отложенный ход.
pub(crate) type Turn = Box<dyn FnOnce() -> BusResult<()>>;

/// Планировщик отложенных ходов.
pub(crate) struct Scheduler {
    tx: mpsc::UnboundedSender<Turn>,
    rx: Mutex<mpsc::UnboundedReceiver<Turn>>,
    pending: Cell<usize>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: Cell::new(0),
        }
    }

    /// Ставит ход в конец очереди.
    pub(crate) fn defer(
        &self,
        turn: Turn,
    ) {
        if self.tx.send(turn).is_err() {
            // Приёмник живёт в этой же структуре.
            warn!("turn queue is closed, dropping deferred turn");
            return;
        }
        self.pending.set(self.pending.get() + 1);
    }

    /// Количество ходов в очереди.
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Выполняет ходы из очереди, пока она не опустеет, включая ходы,
    /// поставленные во время выполнения.
    ///
    /// Возвращает число выполненных ходов. Повторный вход (из обработчика,
    /// работающего внутри хода) ничего не делает и возвращает `Ok(0)`. Если
    /// ход завершился ошибкой, она возвращается, а оставшиеся ходы ждут
    /// следующего вызова.
    pub fn run_pending(&self) -> BusResult<usize> {
        let Ok(mut rx) = self.rx.try_lock() else {
            trace!("turn queue is already being drained");
            return Ok(0);
        };

        let mut ran = 0;
        while let Ok(turn) = rx.try_recv() {
            self.pending.set(self.pending.get().saturating_sub(1));
            ran += 1;
            turn()?;
        }
        Ok(ran)
    }

    /// Бесконечно выполняет ходы по мере поступления, уступая управление
    /// между ними.
    ///
    /// Предназначен для current-thread рантайма tokio. Ошибки ходов
    /// логируются, цикл продолжается.
    pub async fn run(&self) {
        let mut rx = self.rx.lock().await;
        while let Some(turn) = rx.recv().await {
            self.pending.set(self.pending.get().saturating_sub(1));
            if let Err(err) = turn() {
                error!(error = %err, "deferred turn failed");
            }
            tokio::task::yield_now().await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
