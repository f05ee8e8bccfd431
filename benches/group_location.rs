//! Group Location Benchmarks
//!
//! Label search over a bulletin-sized layout: many pages, dense table text,
//! with the whole roster located once per document.
//!
//! Run with: `cargo bench --bench group_location`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use schedule_relay::analyzer::DocumentAnalyzer;
use schedule_relay::config::{Config, CropCalibration};
use schedule_relay::document::{DocumentLayout, PageLayout, TextLine};

/// Layout with `page_count` pages of timetable-like rows
fn create_bulletin_layout(page_count: usize, rows_per_page: usize) -> DocumentLayout {
    let mut pages = Vec::with_capacity(page_count);

    for index in 0..page_count {
        let mut lines = Vec::with_capacity(rows_per_page + 1);
        if index == 0 {
            lines.push(TextLine::monospaced(
                "учебных занятий на 25.12.2024 (среда)",
                250.0,
                560.0,
                6.0,
                12.0,
            ));
        }
        for row in 0..rows_per_page {
            let y = 540.0 - row as f32 * 9.0;
            let text = format!(
                "{} пара ауд. {} Иванов И.И. МДК.01.0{}",
                row % 6 + 1,
                100 + row,
                row % 9
            );
            lines.push(TextLine::monospaced(&text, 40.0, y, 5.0, 8.0));
        }
        pages.push(PageLayout {
            index,
            width: 842.0,
            height: 595.0,
            lines,
        });
    }

    // Group headers on the last page
    if let Some(last) = pages.last_mut() {
        for (i, year) in (21..25).enumerate() {
            let label = format!("РП-{}-1", year);
            last.lines
                .push(TextLine::monospaced(&label, 60.0 + i as f32 * 150.0, 580.0, 5.0, 9.0));
        }
    }

    DocumentLayout { pages }
}

fn analyzer() -> DocumentAnalyzer {
    DocumentAnalyzer::new(&Config::default().analyzer, &CropCalibration::default()).unwrap()
}

/// Benchmark locating every rostered group
fn bench_locate_roster(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate_group");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let analyzer = analyzer();
    let roster: Vec<String> = (21..25).map(|y| format!("РП-{}-1", y)).collect();

    for pages in [4, 20] {
        let layout = create_bulletin_layout(pages, 60);
        group.bench_function(format!("roster_{}_pages", pages), |b| {
            b.iter(|| {
                for label in &roster {
                    black_box(analyzer.locate_group(black_box(&layout), label));
                }
            })
        });
    }

    group.bench_function("missing_label_20_pages", |b| {
        let layout = create_bulletin_layout(20, 60);
        b.iter(|| black_box(analyzer.locate_group(black_box(&layout), "ЭМ-99-1")))
    });

    group.finish();
}

/// Benchmark publication date extraction
fn bench_extract_date(c: &mut Criterion) {
    let analyzer = analyzer();
    let layout = create_bulletin_layout(1, 60);

    let mut group = c.benchmark_group("extract_date");
    group.bench_function("first_page", |b| {
        b.iter(|| black_box(analyzer.extract_date(black_box(&layout))))
    });
    group.finish();
}

criterion_group!(benches, bench_locate_roster, bench_extract_date);
criterion_main!(benches);
