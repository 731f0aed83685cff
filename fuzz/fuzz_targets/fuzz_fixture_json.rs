// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use trustroute::engine::TrustEngine;
use trustroute::fixture::FixtureSource;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = FixtureSource::from_reader(data) else {
        return;
    };
    let Some(user) = source.users.keys().next().cloned() else {
        return;
    };
    let engine = TrustEngine::new(source);
    if let Ok(graph) = engine.build_trust_graph(&user, None) {
        let _ = graph.to_json();
        let _ = graph.to_dot();
        for node in graph.nodes() {
            let _ = engine.find_referral_routes(&user, &node.id, Some(3));
        }
    }
});
