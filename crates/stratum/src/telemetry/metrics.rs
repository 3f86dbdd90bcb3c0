// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use opentelemetry::{
    InstrumentationScope,
    metrics::{Counter, Gauge, Meter, MeterProvider},
};

const METER_NAME: &str = "stratum";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";
const CACHE_EVENT_COUNT_NAME: &str = "cache.event.count";
const CACHE_SIZE_BYTES_NAME: &str = "cache.size_bytes";
const CACHE_ENTRIES_NAME: &str = "cache.entries";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter(CACHE_EVENT_COUNT_NAME)
        .with_description("Cache events")
        .with_unit("{event}")
        .build()
}

pub(crate) fn create_size_bytes_gauge(meter: &Meter) -> Gauge<u64> {
    meter
        .u64_gauge(CACHE_SIZE_BYTES_NAME)
        .with_description("Bytes charged by values resident in the in-memory tier")
        .with_unit("By")
        .build()
}

pub(crate) fn create_entries_gauge(meter: &Meter) -> Gauge<u64> {
    meter
        .u64_gauge(CACHE_ENTRIES_NAME)
        .with_description("Number of entries resident in the in-memory tier")
        .with_unit("{entry}")
        .build()
}
