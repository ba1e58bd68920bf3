// Copyright 2026 The Paxos Store Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Retries a fallible future with a fixed delay schedule.

use std::time::Duration;

use futures::{TryFuture, TryFutureExt};
use tokio::time::sleep;

/// Dial-retry delays, in order, before a peer connection attempt is given up
/// on.
pub fn dial_delays() -> impl Iterator<Item = Duration> {
    [0.1, 1.0, 2.0, 5.0].into_iter().map(Duration::from_secs_f64)
}

/// Retries `future_fn` until it succeeds or `delays` is exhausted, sleeping
/// between attempts.
pub async fn retry<Fut>(
    delays: impl Iterator<Item = Duration>,
    mut future_fn: impl FnMut() -> Fut,
) -> Result<Fut::Ok, Fut::Error>
where
    Fut: TryFuture,
{
    let mut delays = delays.into_iter();

    loop {
        match future_fn().into_future().await {
            Ok(output) => return Ok(output),
            Err(err) => {
                let delay = match delays.next() {
                    Some(delay) => delay,
                    None => return Err(err),
                };
                sleep(delay).await;
            }
        }
    }
}
