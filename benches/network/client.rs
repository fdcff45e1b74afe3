use criterion::{Criterion, Throughput};
use iotagent::Error;
use iotagent::config::{Credentials, MacAddress};
use iotagent::network::client::{MqttClient, Options};
use iotagent::network::{Link, ProtocolClient, Read, Write};
use std::hint::black_box;

/// In-memory link: replays `inbound` forever and discards writes.
struct LoopbackConnection {
    inbound: Vec<u8>,
    cursor: usize,
}

impl LoopbackConnection {
    fn new(inbound: Vec<u8>) -> Self {
        Self { inbound, cursor: 0 }
    }
}

impl Read for LoopbackConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.inbound.is_empty() {
            return Ok(0);
        }
        let mut n = 0;
        while n < buf.len() {
            buf[n] = self.inbound[self.cursor];
            self.cursor = (self.cursor + 1) % self.inbound.len();
            n += 1;
        }
        Ok(n)
    }
}

impl Write for LoopbackConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Link for LoopbackConnection {
    fn init(&mut self, _identity: &MacAddress) -> Result<(), Error> {
        Ok(())
    }

    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), Error> {
        Ok(())
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        true
    }
}

fn setup_client(inbound: &[u8]) -> (MqttClient, LoopbackConnection) {
    let mut link = LoopbackConnection::new(vec![0x20, 0x02, 0x00, 0x00]);
    let mut client = MqttClient::new(Options::default());
    let credentials = Credentials::new("user", "pass", "device").unwrap();
    client
        .connect(&mut link, &credentials, 60)
        .expect("Failed to connect");
    (client, LoopbackConnection::new(inbound.to_vec()))
}

pub fn bench_publish(c: &mut Criterion) {
    let (mut client, mut link) = setup_client(&[]);
    let topic = "v1/user/things/device/data/0";
    let payload = b"temp,c=30.5";

    let mut group = c.benchmark_group("mqtt_publish");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("qos0", |b| {
        b.iter(|| client.publish(&mut link, black_box(topic), black_box(payload)))
    });
    group.finish();
}

pub fn bench_poll(c: &mut Criterion) {
    let mut packet = vec![0x30, 33, 0x00, 27];
    packet.extend_from_slice(b"v1/user/things/device/cmd/3");
    packet.extend_from_slice(b"42,1");
    let (mut client, mut link) = setup_client(&packet);

    let mut group = c.benchmark_group("mqtt_poll");
    group.throughput(Throughput::Bytes(packet.len() as u64));
    group.bench_function("qos0", |b| b.iter(|| client.poll(black_box(&mut link))));
    group.finish();
}
