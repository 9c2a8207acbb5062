// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use statrec::codec::DecodeLimits;
use statrec::RecordStreamReader;

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits::new().max_record_bytes(1 << 20);
    let reader = RecordStreamReader::with_limits(data, limits);

    // Iteration ends on EOF or the first fatal error.
    for result in reader.take(1024) {
        let _ = result;
    }
});
