use chrono::{Days, NaiveDate};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use encoding_rs::UTF_8;
use kpi_trend::{
    bucket::{bucket_by_date, resample},
    dates::normalize,
    ingest::decode,
    pipeline::{WindowSelection, build_trend},
    window::{Interval, Period},
};

fn generate_sales(days: u64, rows_per_day: u64) -> String {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("start date");
    let mut csv = String::from("Date,Revenue,Units,Region\n");
    for day in 0..days {
        let date = (start + Days::new(day)).format("%d-%m-%Y");
        for slot in 0..rows_per_day {
            let region = if slot % 2 == 0 { "North" } else { "South" };
            csv.push_str(&format!(
                "{date},{}.{:02},{},{region}\n",
                100 + (day * 7 + slot) % 900,
                slot % 100,
                1 + slot % 9
            ));
        }
    }
    csv
}

fn bench_pipeline(c: &mut Criterion) {
    let csv = generate_sales(365, 40);
    let raw = decode("sales.csv", csv.as_bytes(), UTF_8).expect("decode sales");
    let table = normalize(&raw).expect("normalize sales");
    let kpis = vec!["Revenue".to_string(), "Units".to_string()];
    let today = NaiveDate::from_ymd_opt(2023, 12, 31).expect("today");

    let mut group = c.benchmark_group("pipeline");

    group.bench_function("normalize_day_first", |b| {
        b.iter(|| normalize(&raw).expect("normalize"));
    });

    group.bench_function("bucket_and_resample_weekly", |b| {
        b.iter_batched(
            || table.clone(),
            |table| {
                let daily = bucket_by_date(&table, &kpis).expect("bucket");
                resample(&daily, Period::Week)
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("trend_one_year", |b| {
        b.iter(|| {
            build_trend(
                &table,
                &kpis,
                WindowSelection::Interval(Interval::OneYear),
                today,
            )
            .expect("trend")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
