//! Benchmarks for flight-watcher
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn benchmark_queue_operations(c: &mut Criterion) {
    use flight_watcher::pool::closable_queue;

    c.bench_function("queue_send_recv", |b| {
        let (sender, receiver) = closable_queue::<String>("bench");

        b.iter(|| {
            sender.send("Madrigal".to_string()).unwrap();
            let received = receiver.try_recv().unwrap();
            black_box(received);
        })
    });
}

fn benchmark_status_advance(c: &mut Criterion) {
    use flight_watcher::flight::FlightStatus;

    let initial =
        FlightStatus::parse("Polarcubis", "DL404,JFK,SEA,OnTime,75", "Titanium,120000,30000")
            .unwrap();

    c.bench_function("status_advance_to_departure", |b| {
        b.iter(|| {
            let mut current = initial.clone();
            while current.departure_time_in_minutes() > 0 {
                current = current.advance();
            }
            black_box(current);
        })
    });
}

fn benchmark_response_parse(c: &mut Criterion) {
    use flight_watcher::flight::FlightStatus;

    c.bench_function("status_parse", |b| {
        b.iter(|| {
            let status = FlightStatus::parse(
                black_box("Estragon"),
                black_box("CX77,BOS,DEN,Delayed,42"),
                black_box("Platinum,50000,10000"),
            );
            black_box(status)
        })
    });
}

fn benchmark_counter(c: &mut Criterion) {
    use flight_watcher::tracking::TrackingCounter;

    c.bench_function("counter_decrement_1000", |b| {
        b.iter(|| {
            let counter = TrackingCounter::new(1000);
            while counter.value() > 0 {
                counter.decrement().unwrap();
            }
            black_box(counter.value())
        })
    });
}

criterion_group!(
    benches,
    benchmark_queue_operations,
    benchmark_status_advance,
    benchmark_response_parse,
    benchmark_counter
);
criterion_main!(benches);
