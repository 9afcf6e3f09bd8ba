//! Performance benchmarks for the .eso streaming parser
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use eso_reader::driver::parse_eso;
use eso_reader::progress::NullProgressSink;
use std::io::Cursor;

/// Builds a synthetic `.eso` file with `num_hours` hourly timestamps
/// across `num_vars` variables, with every fifth record omitted so the
/// sparse-series path is exercised too.
fn generate_eso(num_vars: usize, num_hours: usize) -> String {
    let mut out = String::new();
    out.push_str(
        "Program Version,EnergyPlus, Version 8.9.0-40101eaafd, YMD=2020.05.14 14:22\n",
    );
    out.push_str("1,Average,Zone Timestep\n");
    out.push_str("2,Average,Hourly\n");
    out.push_str("3,Average,Daily\n");
    out.push_str("4,Average,Monthly\n");
    out.push_str("5,Average,Run Period\n");
    out.push_str("6,Average,Annual\n");
    for id in 0..num_vars {
        out.push_str(&format!(
            "{id},1,BLOCK1:ZONE{id},Zone Mean Air Temperature [C] !Hourly\n",
            id = id + 100
        ));
    }
    out.push_str("End of Data Dictionary\n");
    out.push_str("1,Run Period 1\n");

    let mut hour = 0usize;
    for h in 0..num_hours {
        hour += 1;
        let day = (h / 24) + 1;
        let hour_of_day = (h % 24) + 1;
        out.push_str(&format!("2,6,1,{day},0,{hour_of_day},0,60,WeekDay\n"));
        for id in 0..num_vars {
            if (h + id) % 5 == 0 {
                continue;
            }
            out.push_str(&format!("{},{}\n", id + 100, 20.0 + (hour as f64 % 10.0)));
        }
    }
    out.push_str("End of Data\n");
    out
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_eso");

    for (vars, hours) in [(5, 100), (20, 1000), (50, 8760)] {
        let content = generate_eso(vars, hours);
        group.bench_with_input(
            BenchmarkId::new("vars_hours", format!("{vars}x{hours}")),
            &content,
            |b, content| {
                b.iter(|| {
                    let mut sink = NullProgressSink::default();
                    parse_eso(Cursor::new(black_box(content.as_bytes())), 10_000, true, &mut sink)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

fn benchmark_with_peaks_retained(c: &mut Criterion) {
    let content = generate_eso(20, 8760);

    c.bench_function("parse_eso_keep_peaks", |b| {
        b.iter(|| {
            let mut sink = NullProgressSink::default();
            parse_eso(Cursor::new(black_box(content.as_bytes())), 10_000, false, &mut sink)
                .unwrap()
        });
    });
}

criterion_group!(benches, benchmark_parse, benchmark_with_peaks_retained);
criterion_main!(benches);
