// ABOUTME: Benchmark suite for the hex codec, SIM descriptor parsing and reply decoding
// ABOUTME: Measures the per-message work done between the modem line and the decoded result

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use modem_sms::codec::{bytes_to_hex, hex_to_bytes};
use modem_sms::config::SimType;
use modem_sms::datatypes::SmsPdu;
use modem_sms::{AtResponse, Decodable, FcpDescriptor, SmsEngine, SmsRequest, UrcGroup};
use std::time::Duration;

const STORED_PDU: &str = "0011000A8155103254760000AA0BE8329BFD4697D9EC3721";
const USIM_SMSP: &str = "621F8205422100280283026F42A5038001718A01058B036F0606800200508801D0";
const GSM_SMSP: &str = "000000506F42040011FFBB010201281C";

fn bench_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("hex");
    group.measurement_time(Duration::from_secs(10));

    // empty, short, typical and maximum TPDU sizes
    for &size in &[0usize, 23, 140, 164] {
        let bytes: Vec<u8> = (0..size).map(|i| i as u8).collect();
        let hex = bytes_to_hex(&bytes);

        group.bench_with_input(BenchmarkId::new("encode", size), &bytes, |b, bytes| {
            b.iter(|| bytes_to_hex(black_box(bytes)))
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &hex, |b, hex| {
            b.iter(|| hex_to_bytes(black_box(hex)).unwrap())
        });
    }

    group.finish();
}

fn bench_fcp(c: &mut Criterion) {
    let mut group = c.benchmark_group("fcp_parse");
    group.measurement_time(Duration::from_secs(10));

    let usim = hex_to_bytes(USIM_SMSP).unwrap();
    let gsm = hex_to_bytes(GSM_SMSP).unwrap();

    group.bench_function("usim", |b| {
        b.iter(|| FcpDescriptor::parse(black_box(&usim), SimType::Usim).unwrap())
    });
    group.bench_function("gsm", |b| {
        b.iter(|| FcpDescriptor::parse(black_box(&gsm), SimType::Gsm).unwrap())
    });

    group.finish();
}

fn bench_pdu(c: &mut Criterion) {
    let mut group = c.benchmark_group("sms_pdu");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("from_hex", |b| {
        b.iter(|| SmsPdu::from_hex(black_box(STORED_PDU)).unwrap())
    });

    let bytes = hex_to_bytes(STORED_PDU).unwrap();
    group.bench_function("decode_with_length", |b| {
        b.iter(|| SmsPdu::decode_with_length(black_box(&bytes), 24).unwrap())
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.measurement_time(Duration::from_secs(10));

    let engine = SmsEngine::default();
    let reply = AtResponse::ok(["+CMGR: 0,,24", STORED_PDU]);

    group.bench_function("read_message", |b| {
        b.iter(|| {
            let progress = engine
                .dispatch(black_box(&SmsRequest::ReadMessage { index: 0 }))
                .unwrap();
            match progress {
                modem_sms::Progress::Send(exchange) => engine.on_response(exchange, &reply),
                done => done,
            }
        })
    });

    let incoming = UrcGroup::new("+CMT", ["+CMT: ,23", &STORED_PDU[..]]);
    group.bench_function("incoming_message", |b| {
        b.iter(|| engine.on_notification(black_box(&incoming)))
    });

    group.finish();
}

criterion_group!(benches, bench_hex, bench_fcp, bench_pdu, bench_engine);
criterion_main!(benches);
