//! Performance benchmarks for set re-identification.
//!
//! Run with: `cargo bench --bench rewrite`
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | String hash | CRC-32 over member value |
//! | Set rewrite | Re-identify one string set of N members |
//! | Scale set v1 → v2 | Full reshape over N network profiles |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use state_migration_kernel::resources::scale_set::v1_to_v2;
use state_migration_kernel::{hash_string, FlatMap, PathRewriter, RewriteRule, SetHasher};

/// A string set of `n` members under old-scheme identifiers.
fn make_set(n: usize) -> FlatMap {
    let mut map = FlatMap::new();
    map.insert("ids.#", n.to_string());
    for i in 0..n {
        map.insert(format!("ids.{i}"), format!("/subscriptions/bench/resourceGroups/rg/pool-{i}"));
    }
    map
}

/// A version 1 scale set state with `n` network profiles.
fn make_scale_set(n: usize) -> FlatMap {
    let mut map = FlatMap::new();
    map.insert("name", "bench");
    map.insert("network_profile.#", n.to_string());
    for i in 0..n {
        let p = format!("network_profile.{i}");
        map.insert(format!("{p}.name"), format!("nic-{i}"));
        map.insert(format!("{p}.primary"), if i == 0 { "true" } else { "false" });
        map.insert(format!("{p}.ip_configuration.#"), "1");
        map.insert(format!("{p}.ip_configuration.0.name"), "ipconfig");
        map.insert(format!("{p}.ip_configuration.0.application_security_group_ids.#"), "2");
        map.insert(format!("{p}.ip_configuration.0.application_security_group_ids.1"), format!("asg-a-{i}"));
        map.insert(format!("{p}.ip_configuration.0.application_security_group_ids.2"), format!("asg-b-{i}"));
    }
    map
}

fn bench_hash_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_string");

    for len in [16, 256, 4096] {
        let value = "k".repeat(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("bytes", len), &value, |b, value| {
            b.iter(|| hash_string(black_box(value)))
        });
    }

    group.finish();
}

fn bench_set_rewrite(c: &mut Criterion) {
    let rewriter = PathRewriter::new([RewriteRule::rehash("ids", SetHasher::StringValue)]);
    let mut group = c.benchmark_group("set_rewrite");

    for members in [1, 10, 100, 1000] {
        let source = make_set(members);
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::new("members", members), &source, |b, source| {
            b.iter(|| rewriter.apply(black_box(source)).unwrap())
        });
    }

    group.finish();
}

fn bench_scale_set_v1_to_v2(c: &mut Criterion) {
    let rewriter = v1_to_v2();
    let mut group = c.benchmark_group("scale_set_v1_to_v2");

    for profiles in [1, 8, 64] {
        let source = make_scale_set(profiles);
        group.throughput(Throughput::Elements(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("profiles", profiles), &source, |b, source| {
            b.iter(|| rewriter.apply(black_box(source)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash_string, bench_set_rewrite, bench_scale_set_v1_to_v2);
criterion_main!(benches);
