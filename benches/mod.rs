use criterion::{criterion_group, criterion_main};

mod network;

criterion_group!(
    benches,
    network::application::cayenne::bench_decode,
    network::application::cayenne::bench_encode,
    network::client::bench_publish,
    network::client::bench_poll
);
criterion_main!(benches);
