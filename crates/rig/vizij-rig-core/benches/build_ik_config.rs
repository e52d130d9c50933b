//! Benchmarks for IK config assembly and bone classification.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vizij_rig_core::{ChainAssembler, Classifier, NullSink, RigSnapshot};
use vizij_test_fixtures::rigs;

fn load(name: &str) -> RigSnapshot {
    let json = rigs::json(name).expect("rig fixture");
    RigSnapshot::from_json(&json).expect("rig snapshot")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_ik_config");
    let asm = ChainAssembler::default();

    for name in ["mixamo-humanoid", "vrm-no-right-foot"] {
        let snap = load(name);
        group.bench_function(name, |b| {
            b.iter(|| {
                let cfg = snap
                    .build_with_sink(&asm, &mut NullSink)
                    .expect("build");
                black_box(cfg)
            });
        });
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::standard();
    let snap = load("mixamo-humanoid");
    c.bench_function("classify_bones/mixamo", |b| {
        b.iter(|| black_box(classifier.classify_bones(black_box(snap.skeleton.bones()))));
    });
}

criterion_group!(benches, bench_build, bench_classify);
criterion_main!(benches);
