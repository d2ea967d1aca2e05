use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use georef::catalog::Catalog;
use georef::factory::{create_operations, OperationContext};
use georef::projstring::{parse_proj_string, ProjStringConvention};
use georef::wkt::{parse_crs, WktConvention};

fn bench_wkt_parse(c: &mut Criterion) {
    let catalog = Catalog::new();
    let samples: Vec<String> = ["4326", "4807", "32631", "2154"]
        .iter()
        .map(|code| {
            catalog
                .create_crs(code)
                .unwrap()
                .to_wkt(WktConvention::Wkt2_2018)
                .unwrap()
        })
        .collect();

    c.bench_function("wkt2_parse", |b| {
        b.iter(|| {
            for wkt in &samples {
                parse_crs(wkt).unwrap();
            }
        });
    });
}

fn bench_wkt_format(c: &mut Criterion) {
    let catalog = Catalog::new();
    let crs = catalog.create_crs("2154").unwrap();

    c.bench_function("wkt2_format_lambert93", |b| {
        b.iter(|| crs.to_wkt(WktConvention::Wkt2_2018).unwrap());
    });
    c.bench_function("wkt1_format_lambert93", |b| {
        b.iter(|| crs.to_wkt(WktConvention::Wkt1Gdal).unwrap());
    });
}

fn bench_proj_string_parse(c: &mut Criterion) {
    let inputs = [
        "+proj=longlat +ellps=WGS84",
        "+proj=utm +zone=31 +ellps=WGS84",
        "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 \
         +ellps=GRS80",
    ];
    c.bench_function("proj_string_parse", |b| {
        b.iter(|| {
            for input in &inputs {
                parse_proj_string(input).unwrap();
            }
        });
    });
}

fn bench_operation_factory(c: &mut Criterion) {
    let catalog = Catalog::new();
    let pulkovo = catalog.create_crs("4179").unwrap();
    let etrs89 = catalog.create_crs("4258").unwrap();
    let utm31 = catalog.create_crs("32631").unwrap();
    let utm32 = catalog.create_crs("32632").unwrap();
    let ctx = OperationContext {
        catalog: Some(Arc::new(catalog)),
        ..OperationContext::default()
    };

    c.bench_function("factory_geog_to_geog", |b| {
        b.iter(|| {
            let ops = create_operations(&pulkovo, &etrs89, &ctx).unwrap();
            for op in &ops {
                op.to_proj_string(ProjStringConvention::Proj5).unwrap();
            }
        });
    });
    c.bench_function("factory_projected_to_projected", |b| {
        b.iter(|| {
            let ops = create_operations(&utm31, &utm32, &ctx).unwrap();
            for op in &ops {
                op.to_proj_string(ProjStringConvention::Proj5).unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_wkt_parse,
    bench_wkt_format,
    bench_proj_string_parse,
    bench_operation_factory
);
criterion_main!(benches);
