//! Parsing cost of configuration arrays
//!
//! Every protected deposit/withdraw parses its market's array, so this sits on
//! the hot path of the hook pipeline.

use codec::{
    decode, encode, parse_configs, ConfigRecord, HookEntry, PackedSlot, ValidatorEntry,
    MAX_HOOK_SLOTS,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use types::{Address, Wad};

fn full_configuration() -> Vec<PackedSlot> {
    let mut slots = Vec::with_capacity(2 * MAX_HOOK_SLOTS + 1);
    for index in 0..MAX_HOOK_SLOTS as u8 {
        let target = Address::from_low_u64(index as u64 + 1);
        slots.push(encode(&ConfigRecord::PreHook(HookEntry::new(target, index))));
        slots.push(encode(&ConfigRecord::PostHook(HookEntry::new(target, index))));
    }
    let validator = ValidatorEntry::new(Wad::ONE, Wad::from_raw(Wad::SCALE / 50))
        .expect("threshold fits 120 bits");
    slots.push(encode(&ConfigRecord::Validator(validator)));
    slots
}

fn bench_decode(c: &mut Criterion) {
    let slot = encode(&ConfigRecord::PreHook(HookEntry::new(Address::from_low_u64(1), 0)));
    c.bench_function("decode_hook_slot", |b| b.iter(|| decode(black_box(&slot))));
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_configs");

    let full = full_configuration();
    group.bench_function("full_21_slots", |b| b.iter(|| parse_configs(black_box(&full))));

    let validator_only = vec![full[full.len() - 1]];
    group.bench_function("validator_only", |b| {
        b.iter(|| parse_configs(black_box(&validator_only)))
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_parse);
criterion_main!(benches);
