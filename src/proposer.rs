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

//! Proposal number construction and retry-delay selection for the
//! proposer role.
//!
//! The retry loop itself lives on [`crate::consensus::Handler`]'s own
//! `select!` loop rather than a separately spawned task: the two are never
//! allowed to run concurrently with message handling, so folding the retry
//! timer into the same loop keeps that guarantee structural instead of
//! cooperative.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;

/// `bigendian8(unix_millis_now) || first_8_bytes_of(uid)`, interpreted as a
/// 128-bit unsigned integer.
pub fn new_proposal(uid: u128) -> u128 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_millis() as u64;

    let uid_high = (uid >> 64) as u64;
    ((millis as u128) << 64) | uid_high as u128
}

/// A uniformly random delay in `[low, high)` seconds, used to stagger
/// competing proposers.
pub fn next_delay(low: f64, high: f64) -> Duration {
    Duration::from_secs_f64(rand::thread_rng().gen_range(low..high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_numbers_grow_with_time() {
        let uid = 0xdead_beef_u128 << 64;
        let first = new_proposal(uid);
        std::thread::sleep(Duration::from_millis(2));
        let second = new_proposal(uid);
        assert!(second > first);
    }

    #[test]
    fn proposal_low_bits_carry_the_uid() {
        let uid = 0x0102_0304_0506_0708_u128 << 64;
        let proposal = new_proposal(uid);
        assert_eq!(proposal & u128::from(u64::MAX), 0x0102_0304_0506_0708);
    }
}
