//! Scheduler concurrency-cap and failure-path tests.

use anyhow::bail;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stakenet_state_sdk::scheduler::{chunk_ranges, run_chunked};

#[tokio::test]
async fn test_concurrency_cap_is_never_exceeded() {
    const CAP: usize = 4;
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    // 20 chunks, far more than the cap, each holding its slot across a yield.
    let result = run_chunked(1_000, 50, CAP, |range| {
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        async move {
            let in_flight = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(in_flight, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(range.collect::<Vec<usize>>())
        }
    })
    .await
    .unwrap();

    assert_eq!(result.len(), 1_000);
    let observed_peak = peak.load(Ordering::SeqCst);
    assert!(
        observed_peak <= CAP,
        "observed {observed_peak} concurrent workers, cap is {CAP}"
    );
    assert!(
        observed_peak >= 2,
        "scheduler never actually ran workers concurrently"
    );
}

#[tokio::test]
async fn test_partitioning_scenario_450_by_200() {
    // 450 entities at chunk size 200 -> chunks of 200, 200, 50 landing at the
    // correct absolute indices with no gaps or overlaps.
    let ranges = chunk_ranges(450, 200);
    assert_eq!(ranges.len(), 3);
    assert_eq!(ranges[0].len(), 200);
    assert_eq!(ranges[1].len(), 200);
    assert_eq!(ranges[2].len(), 50);

    let chunk_starts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let result = run_chunked(450, 200, 8, |range| {
        let chunk_starts = Arc::clone(&chunk_starts);
        async move {
            chunk_starts.lock().unwrap().push(range.start);
            Ok(range.map(|i| i * 10).collect::<Vec<usize>>())
        }
    })
    .await
    .unwrap();

    assert_eq!(result.len(), 450);
    for (i, v) in result.iter().enumerate() {
        assert_eq!(*v, i * 10, "slot {i} written by the wrong chunk");
    }
    let mut starts = chunk_starts.lock().unwrap().clone();
    starts.sort_unstable();
    assert_eq!(starts, vec![0, 200, 400]);
}

#[tokio::test]
async fn test_failure_yields_no_partial_result() {
    let completed = Arc::new(AtomicUsize::new(0));

    let result = run_chunked(1_000, 100, 2, |range| {
        let completed = Arc::clone(&completed);
        async move {
            if range.start == 300 {
                bail!("transport error");
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(range.collect::<Vec<usize>>())
        }
    })
    .await;

    // Some sibling chunks completed before the failure, but their results are
    // discarded along with the stream; the caller sees only the error.
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("chunk 300..400"));
    assert!(format!("{err:#}").contains("transport error"));
}
