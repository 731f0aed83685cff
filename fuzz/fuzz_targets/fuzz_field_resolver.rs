// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use trustroute::resolver::{self, RawRecord};
use trustroute::types::MAX_STRENGTH;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let record = RawRecord::from(value);

    let category = resolver::resolve_category(&record);
    assert!(!category.reason.is_empty());

    let strength = resolver::resolve_strength(&record);
    assert!((0.0..=MAX_STRENGTH).contains(&strength.value));

    let _ = resolver::resolve_organization_name(&record);
    let _ = resolver::resolve_record_id(&record);
    let _ = resolver::resolve_logo_ref(&record);
});
