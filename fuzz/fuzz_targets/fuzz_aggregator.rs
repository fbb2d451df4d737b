//! Fuzz target: `ReadingAggregator`
//!
//! Interprets the input as a stream of (axis, length, payload) notifications
//! and checks that a snapshot is only ever produced once all three axes
//! have arrived since the previous one.
//!
//! cargo fuzz run fuzz_aggregator

#![no_main]

use adxl_link::aggregator::ReadingAggregator;
use adxl_link::protocol::Axis;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let agg = ReadingAggregator::new();
    let mut fresh = [false; Axis::COUNT];
    let mut rest = data;

    while let [sel, len, tail @ ..] = rest {
        let axis = Axis::ALL[usize::from(*sel) % Axis::COUNT];
        let n = usize::from(*len % 16).min(tail.len());
        agg.on_notify(axis, &tail[..n]);
        fresh[axis.index()] = true;
        rest = &tail[n..];

        match agg.take_complete() {
            Some(_) => {
                assert!(fresh.iter().all(|f| *f), "partial snapshot");
                fresh = [false; Axis::COUNT];
            }
            None => assert!(!fresh.iter().all(|f| *f), "complete set withheld"),
        }
    }
});
