// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use statrec::codec::{self, DecodeLimits};

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits::new().max_array_len(65_536);

    // Anything that decodes must re-encode to the same bytes.
    if let Ok((record, consumed)) = codec::decode_prefix(data, &limits) {
        let encoded = codec::encode(&record).expect("decoded record re-encodes");
        assert_eq!(&encoded[..], &data[..consumed]);
    }
});
