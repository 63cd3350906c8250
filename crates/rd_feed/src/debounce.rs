use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Forward values from `input` once they have been stable for `window`.
///
/// A value equal to the last one forwarded is swallowed. The initial value
/// of `input` counts as already forwarded. The task ends when the sender of
/// `input` is dropped or `emit` returns `false`.
pub fn debounce<T, F>(window: Duration, mut input: watch::Receiver<T>, mut emit: F) -> JoinHandle<()>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: FnMut(T) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = input.borrow_and_update().clone();
        while input.changed().await.is_ok() {
            loop {
                tokio::select! {
                    changed = input.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(window) => break,
                }
            }

            let settled = input.borrow_and_update().clone();
            if settled == last {
                continue;
            }
            last = settled.clone();
            if !emit(settled) {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl FnMut(String) -> bool + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value| {
            sink.lock().unwrap().push(value);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_collapse_to_last() {
        let (tx, rx) = watch::channel(String::new());
        let (seen, emit) = recorder();
        let _task = debounce(Duration::from_millis(500), rx, emit);

        for text in ["r", "ru", "rus", "rust"] {
            tx.send(text.to_string()).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(seen.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*seen.lock().unwrap(), vec!["rust"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_value_is_not_forwarded_twice() {
        let (tx, rx) = watch::channel(String::new());
        let (seen, emit) = recorder();
        let _task = debounce(Duration::from_millis(500), rx, emit);

        tx.send("rust".to_string()).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        tx.send("rus".to_string()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send("rust".to_string()).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        tx.send(String::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["rust", ""]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_sender_dropped() {
        let (tx, rx) = watch::channel(String::new());
        let (_seen, emit) = recorder();
        let task = debounce(Duration::from_millis(500), rx, emit);
        drop(tx);
        task.await.unwrap();
    }
}
