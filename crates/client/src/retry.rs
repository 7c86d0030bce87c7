// Copyright 2021 Conflux Foundation. All rights reserved.
// Conflux is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use log::warn;
use std::{fmt::Display, future::Future, time::Duration};

/// Bounded retry around a transport call: at most `attempts` tries with a
/// fixed delay in between, surfacing the last error after exhaustion.
/// Parsing never runs through here; only round trips are retriable.
pub async fn with_retry<T, E, F, Fut>(
    attempts: usize, delay: Duration, label: &str, mut call: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut remaining = attempts.max(1);
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                remaining -= 1;
                if remaining == 0 {
                    return Err(error);
                }
                warn!(
                    "{} failed ({} attempts left): {}",
                    label, remaining, error
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::with_retry;
    use std::time::Duration;

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let mut calls = 0u32;
        let result: Result<u32, String> =
            with_retry(3, Duration::from_millis(1), "test", || {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt < 3 {
                        Err("transient".to_string())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn exhaustion_surfaces_the_last_error() {
        let mut calls = 0u32;
        let result: Result<u32, String> =
            with_retry(2, Duration::from_millis(1), "test", || {
                calls += 1;
                async { Err("down".to_string()) }
            })
            .await;
        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls, 2);
    }
}
