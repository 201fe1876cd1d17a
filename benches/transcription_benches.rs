use RustedPMP::Examples::ocp_examples::{brachistochrone, constrained_double_integrator};
use RustedPMP::optimal_control::indirect::{TranscriptionOptions, ocp_to_bvp};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_brachistochrone(c: &mut Criterion) {
    let ocp = brachistochrone();
    let options = TranscriptionOptions::default();
    c.bench_function("brachistochrone PMP", |b| {
        b.iter(|| ocp_to_bvp(black_box(&ocp), &options))
    });
}

fn bench_path_constraints(c: &mut Criterion) {
    let ocp = constrained_double_integrator();
    let mut group = c.benchmark_group("path constraint");
    for (control, path) in [("pmp", "utm"), ("icrm", "utm"), ("icrm", "icrm")] {
        if let Ok(options) = TranscriptionOptions::from_names(control, path) {
            group.bench_function(format!("{}/{}", control, path), |b| {
                b.iter(|| ocp_to_bvp(black_box(&ocp), &options))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_brachistochrone, bench_path_constraints);
criterion_main!(benches);
