use aqi_core::gbdt::{Model, Node, Tree};
use aqi_core::{FeatureSchema, InferenceContext, Palette, PredictionRequest};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

const CITY_COUNT: usize = 26;
const TREE_COUNT: usize = 100;

fn schema() -> FeatureSchema {
    let mut columns = vec!["Month".to_string(), "Date_".to_string(), "Year".to_string()];
    columns.extend((0..CITY_COUNT).map(|i| format!("City_C{i:02}")));
    FeatureSchema::with_default_keys(columns).unwrap()
}

fn forest() -> Model {
    let trees = (0..TREE_COUNT)
        .map(|i| {
            let city_feature = (3 + i % CITY_COUNT) as i32;
            Tree::new(
                vec![
                    Node::internal(0, 0, 6.5, 1, 2),
                    Node::internal(1, city_feature, 0.5, 3, 4),
                    Node::internal(2, 1, 15.5, 5, 6),
                    Node::leaf(3, 120.0),
                    Node::leaf(4, 260.0),
                    Node::leaf(5, 80.0),
                    Node::leaf(6, 95.0),
                ],
                1.0,
            )
        })
        .collect();
    Model::forest(trees)
}

fn bench_estimate(c: &mut Criterion) {
    let ctx = InferenceContext::new(schema(), Arc::new(forest()), Palette::default()).unwrap();
    let requests: Vec<PredictionRequest> = (0..CITY_COUNT)
        .map(|i| PredictionRequest::new(format!("C{i:02}"), (i % 12) as i64 + 1, 14, 2023))
        .collect();

    let mut group = c.benchmark_group("aqi_estimate");
    group.throughput(Throughput::Elements(requests.len() as u64));
    group.bench_function("forest_100_trees", |b| {
        b.iter(|| {
            for request in &requests {
                black_box(ctx.estimate(black_box(request)).unwrap());
            }
        })
    });
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let schema = schema();
    let request = PredictionRequest::new("C07", 11, 3, 2022);
    c.bench_function("encode_request", |b| {
        b.iter(|| black_box(aqi_core::encode(&schema, black_box(&request)).unwrap()))
    });
}

criterion_group!(benches, bench_estimate, bench_encode);
criterion_main!(benches);
