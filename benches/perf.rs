use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use nhl_shot_chart::aggregate::{Visibility, aggregate};
use nhl_shot_chart::chart::{ChartHeader, ChartSpec, render_png};
use nhl_shot_chart::game::{PeriodType, RawEvent};
use nhl_shot_chart::game_feed::parse_game_feed_json;
use nhl_shot_chart::schedule::parse_schedule_json;

// A full game has roughly 100-130 attempts; repeat the pattern well past that.
fn synthetic_events(count: usize) -> Vec<RawEvent> {
    let labels = ["Shot", "Missed Shot", "Goal", "Faceoff", "Blocked Shot"];
    (0..count)
        .map(|idx| {
            let x = ((idx * 37) % 190) as f64 - 95.0;
            let y = ((idx * 13) % 80) as f64 - 40.0;
            let period_type = if idx + 10 >= count {
                PeriodType::Shootout
            } else {
                PeriodType::Regular
            };
            RawEvent {
                sequence: idx,
                label: Some(labels[idx % labels.len()].to_string()),
                team: Some(if idx % 2 == 0 { "SEA" } else { "NYI" }.to_string()),
                x: Some(x),
                y: Some(y),
                period_type: Some(period_type),
                period: Some(((idx / 100) as u8).saturating_add(1)),
                period_time: None,
            }
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let events = synthetic_events(400);
    c.bench_function("aggregate_400_plays", |b| {
        b.iter(|| {
            let tally = aggregate(black_box(&events), "SEA", Visibility::default());
            black_box(tally.markers.len());
        })
    });
}

fn bench_feed_parse(c: &mut Criterion) {
    c.bench_function("edge_feed_parse", |b| {
        b.iter(|| {
            let feed = parse_game_feed_json(black_box(EDGE_FEED_JSON), "2023020248").unwrap();
            black_box(feed.events.len());
        })
    });
    c.bench_function("statsapi_feed_parse", |b| {
        b.iter(|| {
            let feed = parse_game_feed_json(black_box(STATSAPI_FEED_JSON), "2022010001").unwrap();
            black_box(feed.events.len());
        })
    });
}

fn bench_schedule_parse(c: &mut Criterion) {
    c.bench_function("edge_schedule_parse", |b| {
        b.iter(|| {
            let rows = parse_schedule_json(black_box(EDGE_SCHEDULE_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let tally = aggregate(&synthetic_events(400), "SEA", Visibility::default());
    let header = ChartHeader {
        home: "SEA",
        away: "NYI",
        period_time_remaining: Some("Final"),
        period_ordinal: Some("SO"),
        start_local: None,
    };
    let spec = ChartSpec::build(&header, &tally, false, (1000, 1000));
    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    group.bench_function("render_png_1000", |b| {
        b.iter(|| {
            let png = render_png(black_box(&spec)).unwrap();
            black_box(png.len());
        })
    });
    group.finish();
}

criterion_group!(perf, bench_aggregate, bench_feed_parse, bench_schedule_parse, bench_render);
criterion_main!(perf);

static EDGE_FEED_JSON: &str = include_str!("../tests/fixtures/edge_play_by_play_shootout.json");
static STATSAPI_FEED_JSON: &str = include_str!("../tests/fixtures/statsapi_live_feed.json");
static EDGE_SCHEDULE_JSON: &str = include_str!("../tests/fixtures/edge_club_schedule.json");
