// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use trustroute::normalize::normalize;
use trustroute::types::NodeId;

fuzz_target!(|name: &str| {
    let once = normalize(name);
    assert_eq!(normalize(&once), once, "normalize not idempotent for {name:?}");
    assert_eq!(NodeId::organization(name), NodeId::organization(&once));
});
