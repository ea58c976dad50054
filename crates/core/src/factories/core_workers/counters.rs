use blockswap_api::Stat;
use std::sync::Mutex;

/// Send statistics shared by all task workers.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    stat: Mutex<Stat>,
}

impl Counters {
    /// Count one sent block of `len` bytes.
    pub fn record_sent(&self, len: usize) {
        let mut lock = self.stat.lock().unwrap();
        lock.blocks_sent += 1;
        lock.data_sent += len as u64;
    }

    pub fn snapshot(&self) -> Stat {
        *self.stat.lock().unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn concurrent_updates_are_not_lost() {
        let counters = Arc::new(Counters::default());

        let handles = (1..=8_usize)
            .map(|t| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.record_sent(t);
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }

        let stat = counters.snapshot();
        assert_eq!(8000, stat.blocks_sent);
        // 1000 * (1 + 2 + .. + 8)
        assert_eq!(36_000, stat.data_sent);
    }
}
