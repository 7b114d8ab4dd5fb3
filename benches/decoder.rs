//! Benchmarks for service-data decoding and advertisement dispatch.
//!
//! The decoders sit on the hot path of every advertisement the controller
//! passes up, so they are benchmarked both alone and through the full
//! dispatcher pipeline.

use atc_listener::dispatcher::{ATC_MAC_PREFIX, Dispatcher};
use atc_listener::scanner::{Advertisement, ENVIRONMENTAL_SENSING_SERVICE};
use atc_listener::{MacAddress, decode_atc1441, decode_custom, decode_service_data};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::collections::HashMap;

const BENCH_MAC: MacAddress = MacAddress([0xA4, 0xC1, 0x38, 0x29, 0xF2, 0x91]);

/// Custom-format service data: 21.50 °C, 55.30 %, 2980 mV, 72 %
fn custom_service_data() -> Vec<u8> {
    vec![
        0xA4, 0xC1, 0x38, 0x29, 0xF2, 0x91, // MAC echo
        0x66, 0x08, // temperature 2150
        0x9A, 0x15, // humidity 5530
        0xA4, 0x0B, // battery 2980 mV
        0x48, // battery 72 %
        0x00, // counter
        0x00, // flags
    ]
}

/// atc1441-format service data: 22 °C, 48 %, 65 %, 3010 mV
fn atc1441_service_data() -> Vec<u8> {
    vec![
        0xA4, 0xC1, 0x38, 0x29, 0xF2, 0x91, // MAC echo
        0x16, 0x00, // temperature 22
        0x30, // humidity 48
        0x41, // battery 65 %
        0xC2, 0x0B, // battery 3010 mV
        0x00, // counter
    ]
}

fn advertisement(data: Vec<u8>) -> Advertisement {
    let mut service_data = HashMap::new();
    service_data.insert(ENVIRONMENTAL_SENSING_SERVICE, data);
    Advertisement {
        mac: BENCH_MAC,
        name: Some("bedroom".to_string()),
        rssi: Some(-67),
        service_data,
    }
}

fn bench_decoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");
    group.throughput(Throughput::Elements(1));

    let custom = custom_service_data();
    group.bench_function("custom", |b| {
        b.iter(|| decode_custom(black_box(&custom[6..])).unwrap())
    });

    let atc1441 = atc1441_service_data();
    group.bench_function("atc1441", |b| {
        b.iter(|| decode_atc1441(black_box(&atc1441[6..])).unwrap())
    });

    group.bench_function("service_data_detect", |b| {
        b.iter(|| decode_service_data(black_box(&custom)).unwrap())
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let dispatcher = Dispatcher::new(ATC_MAC_PREFIX, ENVIRONMENTAL_SENSING_SERVICE, "Environment");

    let custom = advertisement(custom_service_data());
    group.throughput(Throughput::Elements(1));
    group.bench_function("custom_advertisement", |b| {
        b.iter(|| dispatcher.handle(black_box(&custom)))
    });

    let unrecognized = advertisement(vec![0u8; 10]);
    group.bench_function("unrecognized_length", |b| {
        b.iter(|| dispatcher.handle(black_box(&unrecognized)))
    });

    let foreign = Advertisement {
        mac: MacAddress([0xAA, 0xBB, 0xCC, 0x00, 0x00, 0x00]),
        ..advertisement(custom_service_data())
    };
    group.bench_function("foreign_device", |b| {
        b.iter(|| dispatcher.handle(black_box(&foreign)))
    });

    group.finish();
}

criterion_group!(benches, bench_decoders, bench_dispatch);
criterion_main!(benches);
