//! Test utilities shared by the blockswap crates.

pub mod block;
pub mod id;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Generate `len` random bytes.
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngCore;
    let mut out = vec![0_u8; len];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

/// Poll a block of code until it `break`s out of the loop, panicking if
/// that does not happen before the timeout.
///
/// - `iter_check!(timeout_ms, sleep_ms, { .. })`
/// - `iter_check!(timeout_ms, { .. })`, polls every 10 ms
/// - `iter_check!({ .. })`, times out after 1 s
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $sleep_ms:expr, $code:block) => {
        tokio::time::timeout(
            std::time::Duration::from_millis($timeout_ms),
            async {
                loop {
                    $code
                    tokio::time::sleep(std::time::Duration::from_millis(
                        $sleep_ms,
                    ))
                    .await;
                }
            },
        )
        .await
        .expect("iter_check timed out");
    };
    ($timeout_ms:expr, $code:block) => {
        $crate::iter_check!($timeout_ms, 10, $code)
    };
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}

#[cfg(test)]
mod test {
    #[tokio::test(start_paused = true)]
    async fn iter_check_breaks() {
        let mut count = 0;
        iter_check!({
            count += 1;
            if count == 3 {
                break;
            }
        });
        assert_eq!(3, count);
    }
}
