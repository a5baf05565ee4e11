//! Background job polling for the GUI thread.
//!
//! Jobs run on their own worker thread and report exactly one result.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{Receiver, TryRecvError};

pub struct AsyncJob<T> {
    receiver: Option<Receiver<Result<T>>>,
}

impl<T> AsyncJob<T> {
    pub fn new(receiver: Receiver<Result<T>>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Returns `Some(result)` once, when the job has finished.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let rx = self.receiver.as_ref()?;
        match rx.try_recv() {
            Ok(res) => {
                self.receiver = None;
                Some(res)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(anyhow!("Worker task disconnected")))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Poll an optional job slot, clearing it when the job finishes.
pub fn take_finished<T>(slot: &mut Option<AsyncJob<T>>) -> Option<Result<T>> {
    let result = slot.as_mut()?.poll();
    if result.is_some() {
        *slot = None;
    }
    result
}
