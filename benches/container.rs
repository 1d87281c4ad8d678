#![allow(unused)]
extern crate metabind;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use metabind::{ExifData, Key, TypeId, Value, XmpData, XmpFormatFlags, XmpParser};
use std::hint::black_box;

const EXIF_KEYS: [&str; 6] = [
    "Exif.Image.Make",
    "Exif.Image.Model",
    "Exif.Photo.ExposureTime",
    "Exif.Photo.FNumber",
    "Exif.GPSInfo.GPSLatitudeRef",
    "Exif.GPSInfo.GPSAltitude",
];

fn exif_with(entries: usize) -> ExifData {
    let keys: Vec<Key> = EXIF_KEYS.iter().map(|k| Key::parse(k).unwrap()).collect();
    let mut exif = ExifData::new();
    for n in 0..entries {
        let key = &keys[n % keys.len()];
        exif.add(key.clone(), Value::ascii(format!("value {n}")))
            .unwrap();
    }
    exif
}

/// Benchmark container construction, lookup and sorting
fn bench_container(c: &mut Criterion) {
    let mut group = c.benchmark_group("container");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("add_1000", |b| {
        b.iter(|| black_box(exif_with(1000)));
    });

    let exif = exif_with(1000);
    let model = Key::parse("Exif.Image.Model").unwrap();
    group.bench_function("find_key", |b| {
        b.iter(|| black_box(exif.find_key(black_box(&model))));
    });

    group.bench_function("iterate", |b| {
        b.iter(|| {
            let count = exif.iter().filter(Result::is_ok).count();
            black_box(count)
        });
    });

    group.bench_function("sort_by_key", |b| {
        b.iter_batched(
            || exif.deep_clone(),
            |mut exif| {
                exif.sort_by_key();
                exif
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

/// Benchmark value parsing of numeric arrays
fn bench_values(c: &mut Criterion) {
    let text = (0..256).map(|n| format!("{n}/7")).collect::<Vec<_>>().join(" ");

    let mut group = c.benchmark_group("values");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("parse_rational_256", |b| {
        b.iter(|| black_box(Value::parse(TypeId::Rational, black_box(&text)).unwrap()));
    });
    group.finish();
}

/// Benchmark XMP packet encoding and decoding
fn bench_xmp(c: &mut Criterion) {
    let parser = XmpParser::initialize().unwrap();
    let mut xmp = XmpData::new();
    for n in 0..100 {
        xmp.add(
            Key::parse(&format!("Xmp.xmp.Label{n}")).unwrap(),
            Value::xmp_text(format!("label {n}")),
        )
        .unwrap();
    }
    let packet = parser.encode(&xmp, XmpFormatFlags::empty()).unwrap();

    let mut group = c.benchmark_group("xmp");
    group.throughput(Throughput::Bytes(packet.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(parser.encode(&xmp, XmpFormatFlags::empty()).unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(parser.decode(black_box(&packet)).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_container, bench_values, bench_xmp);
criterion_main!(benches);
