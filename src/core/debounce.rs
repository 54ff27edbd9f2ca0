use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// A single replaceable timer. Each `schedule` aborts the previous timer and
/// bumps the generation; the message posted on expiry carries the generation
/// so the owner can drop a firing that raced with a newer schedule.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: u64,
    armed: Option<u64>,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            armed: None,
            handle: None,
        }
    }

    /// Must be called from within a Tokio runtime.
    pub fn schedule<E, F>(&mut self, tx: &UnboundedSender<E>, make_event: F) -> u64
    where
        E: Send + 'static,
        F: FnOnce(u64) -> E + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let delay = self.delay;
        let tx = tx.clone();

        self.armed = Some(generation);
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // 接收端已關閉代表控制器已被丟棄
            let _ = tx.send(make_event(generation));
        }));
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.armed = None;
    }

    /// Accepts a firing only for the currently armed generation, disarming it.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.armed == Some(generation) {
            self.armed = None;
            self.handle = None;
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_quiet_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        let generation = debouncer.schedule(&tx, |g| g);
        assert!(debouncer.is_armed());

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, generation);
        assert!(debouncer.fire(fired));
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        let first = debouncer.schedule(&tx, |g| g);
        tokio::time::sleep(Duration::from_millis(600)).await;
        let second = debouncer.schedule(&tx, |g| g);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, second);
        assert!(!debouncer.fire(first));
        assert!(debouncer.fire(second));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u64>();
        let mut debouncer = Debouncer::new(Duration::from_millis(100));

        let generation = debouncer.schedule(&tx, |g| g);
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
        assert!(!debouncer.fire(generation));
    }
}
