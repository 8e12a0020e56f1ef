//! Read-Only Guard Benchmarks
//!
//! Measures validation of typical ad-hoc statements and marker detection on
//! the injection payloads.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use library_admin::{injection_markers, validate_read_only, DEMOS};

fn bench_validate(c: &mut Criterion) {
    let select = "SELECT r.full_name, b.title FROM loans l \
                  JOIN readers r ON l.reader_id = r.reader_id \
                  JOIN copies c ON l.copy_id = c.copy_id \
                  JOIN books b ON c.book_id = b.book_id -- open loans\n\
                  WHERE l.return_date IS NULL";
    let stacked = "SELECT * FROM books; DROP TABLE loans";

    c.bench_function("validate_select_with_joins", |b| {
        b.iter(|| validate_read_only(black_box(select)));
    });

    c.bench_function("validate_stacked_rejected", |b| {
        b.iter(|| validate_read_only(black_box(stacked)));
    });
}

fn bench_markers(c: &mut Criterion) {
    let payloads: Vec<&str> =
        DEMOS.iter().flat_map(|d| d.inputs.iter().map(|(_, input)| *input)).collect();

    c.bench_function("injection_markers_all_payloads", |b| {
        b.iter(|| {
            for payload in &payloads {
                black_box(injection_markers(black_box(payload)));
            }
        });
    });
}

criterion_group!(benches, bench_validate, bench_markers);
criterion_main!(benches);
