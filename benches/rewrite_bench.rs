use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protectnet::protect::family::{replace_ip, scan};
use protectnet::protect::parse_resolver_list;

fn bench_resolver_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver_rewrite");

    // Typical mobile resolver list: carrier v6 first, then v4, one junk entry
    let resolvers = parse_resolver_list("2001:4860:4860::8888,bad-entry,10.0.0.1,10.0.0.2");

    group.bench_function("scan_v4_behind_v6", |b| {
        b.iter(|| black_box(scan(black_box(&resolvers), true)));
    });

    group.bench_function("replace_v4", |b| {
        b.iter(|| black_box(replace_ip(black_box("8.8.8.8:53"), &resolvers)));
    });

    group.bench_function("replace_v6", |b| {
        b.iter(|| black_box(replace_ip(black_box("[2606:4700:4700::1111]:53"), &resolvers)));
    });

    group.bench_function("parse_and_replace", |b| {
        b.iter(|| {
            let list = parse_resolver_list(black_box("10.0.0.1,10.0.0.2,2001:db8::1"));
            black_box(replace_ip("8.8.8.8:53", &list))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolver_rewrite);
criterion_main!(benches);
