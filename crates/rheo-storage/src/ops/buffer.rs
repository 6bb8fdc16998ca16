// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Transfer buffer sizing

pub const MIN_BUFFER_SIZE: usize = 1024;
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// `clamp(next_pow2(size / 16), 1 KiB, 1 MiB)`.
pub fn buffer_size_for(total: u64) -> usize {
    let target = (total / 16).max(1).next_power_of_two();
    target.clamp(MIN_BUFFER_SIZE as u64, MAX_BUFFER_SIZE as u64) as usize
}
