use criterion::{BenchmarkId, Criterion, Throughput};
use iotagent::network::application::cayenne::{
    Channel, DataPoint, Message, Topic, Value, encode_response, topic_path, types,
};
use std::hint::black_box;

const INBOUND: &[(&str, &str)] = &[
    ("command", "v1/user/things/device/cmd/3"),
    ("data", "v1/user/things/device/data/0"),
    ("short", "cmd/12"),
];

pub fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("cayenne_decode");
    for (name, topic) in INBOUND {
        let payload: &[u8] = if topic.contains("/data/") {
            b"temp,c,f=21.5,70.7"
        } else {
            b"42,1"
        };
        group.throughput(Throughput::Bytes((topic.len() + payload.len()) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), topic, |b, topic| {
            b.iter(|| Message::decode(black_box(topic), black_box(payload)))
        });
    }

    let message = Message::decode("v1/user/things/device/cmd/3", b"42,1").unwrap();
    group.bench_function("to_json", |b| {
        let mut buf = [0u8; 256];
        b.iter(|| black_box(&message).to_json(&mut buf))
    });
    group.finish();
}

pub fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("cayenne_encode");

    group.bench_function("topic_path", |b| {
        b.iter(|| {
            topic_path(
                black_box("user"),
                black_box("device"),
                &Topic::Data,
                Channel::Number(7),
            )
        })
    });

    let points = [
        ("float", DataPoint::new(0, 30.5).with_type(types::TEMPERATURE).with_unit(types::CELSIUS)),
        ("int", DataPoint::new(1, 1000).with_type(types::LUMINOSITY).with_unit(types::LUX)),
        (
            "gps",
            DataPoint::new(
                2,
                Value::Gps {
                    latitude: 51.5072,
                    longitude: -0.1276,
                    altitude: 35.0,
                },
            )
            .with_type(types::GPS)
            .with_unit(types::METER),
        ),
    ];
    for (name, point) in &points {
        group.bench_with_input(BenchmarkId::new("payload", name), point, |b, point| {
            b.iter(|| black_box(point).payload())
        });
    }

    group.bench_function("response", |b| {
        b.iter(|| encode_response(black_box(Some("42")), black_box(Some("relay stuck"))))
    });
    group.finish();
}
