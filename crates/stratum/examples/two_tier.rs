// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A small L1 in front of a recording lower tier: evictions flow down, misses fall through.

use stratum::{Cache, CacheTier, EventBroker, MockTier, TelemetryConfig, TierOp};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let broker = EventBroker::<&'static str>::new();
    let lower = MockTier::<u32, u64, &'static str>::new();

    // Room for two values in L1.
    let cache = Cache::builder::<u32, u64, &'static str>()
        .name("two_tier")
        .max_bytes(16)
        .lower_tier(lower.clone())
        .telemetry(TelemetryConfig::new().build())
        .build(&broker);

    cache.insert(&1, 10, Some("mission_updated"));
    cache.insert(&2, 20, None);
    let evicted = cache.insert(&3, 30, None);
    println!("evicted from L1: {:?}", evicted.iter().map(|e| *e.key()).collect::<Vec<_>>());
    println!("lower tier holds {:?} entries", lower.len());

    // Key 1 is served by the lower tier and promoted back into L1.
    println!("get(1) = {}", cache.get(&1)?);
    println!("L1 now holds {:?}", cache.l1().keys());

    broker.publish(&"mission_updated", None)?;
    println!("after event: contains(1) = {}", cache.contains(&1));

    // Failures in the lower tier surface as a miss with the tier error as its cause.
    lower.fail_when(|op| matches!(op, TierOp::Get(_)));
    if let Err(miss) = cache.get(&42) {
        println!("{miss}");
    }

    println!("lower tier saw {} operations", lower.operations().len());
    Ok(())
}
