//! # Chunk Scheduler
//!
//! Partitions an index range into contiguous chunks and runs one async worker per
//! chunk under a global concurrency cap. Workers own their chunk's output until the
//! join point, so no two workers ever write the same slot.

use anyhow::{bail, Context, Result};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::ops::Range;

/// Splits `[0, total)` into contiguous, non-overlapping ranges of at most
/// `chunk_size` items. `total == 0` yields no ranges.
pub fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::with_capacity((total + chunk_size - 1) / chunk_size);
    let mut start = 0;
    while start < total {
        let end = (start + chunk_size).min(total);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Runs `worker` once per chunk of `[0, total)` with at most `concurrency` workers
/// in flight, and reassembles the per-chunk outputs into one `Vec` ordered by
/// absolute index.
///
/// Each worker must return exactly `range.len()` items for its range; anything else
/// is treated as a fetch bug and fails the run. On the first worker error the whole
/// run fails: remaining chunk futures are dropped and completed sibling results are
/// discarded. `total == 0` completes immediately without dispatching any worker.
pub async fn run_chunked<T, F, Fut>(
    total: usize,
    chunk_size: usize,
    concurrency: usize,
    worker: F,
) -> Result<Vec<T>>
where
    F: Fn(Range<usize>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    if total == 0 {
        return Ok(Vec::new());
    }

    let ranges = chunk_ranges(total, chunk_size);
    let mut chunks: Vec<(usize, Vec<T>)> = stream::iter(ranges)
        .map(|range| {
            let fut = worker(range.clone());
            async move {
                let items = fut
                    .await
                    .with_context(|| format!("chunk {}..{}", range.start, range.end))?;
                if items.len() != range.len() {
                    bail!(
                        "chunk {}..{} produced {} items, expected {}",
                        range.start,
                        range.end,
                        items.len(),
                        range.len()
                    );
                }
                Ok::<_, anyhow::Error>((range.start, items))
            }
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;

    // Chunks complete in arbitrary order; reassemble by absolute offset.
    chunks.sort_unstable_by_key(|(offset, _)| *offset);
    let mut out = Vec::with_capacity(total);
    for (_, items) in chunks {
        out.extend(items);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_ranges_divides_exactly() {
        let ranges = chunk_ranges(400, 200);
        assert_eq!(ranges, vec![0..200, 200..400]);
    }

    #[test]
    fn test_chunk_ranges_with_remainder() {
        // 450 items at chunk size 200 -> 200, 200, 50
        let ranges = chunk_ranges(450, 200);
        assert_eq!(ranges, vec![0..200, 200..400, 400..450]);
    }

    #[test]
    fn test_chunk_ranges_empty() {
        assert!(chunk_ranges(0, 200).is_empty());
    }

    #[tokio::test]
    async fn test_run_chunked_preserves_absolute_order() {
        // Workers finish out of order (later chunks sleep less); the output must
        // still be ordered by absolute index with no gaps or overlaps.
        let result = run_chunked(450, 200, 8, |range| async move {
            let delay = 50u64.saturating_sub(range.start as u64 / 10);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            Ok(range.collect::<Vec<usize>>())
        })
        .await
        .unwrap();

        assert_eq!(result.len(), 450);
        for (i, v) in result.iter().enumerate() {
            assert_eq!(*v, i);
        }
    }

    #[tokio::test]
    async fn test_run_chunked_empty_population() {
        let result: Vec<usize> = run_chunked(0, 200, 8, |_range| async move {
            panic!("no worker should be dispatched for an empty population");
        })
        .await
        .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_run_chunked_propagates_first_error() {
        let result = run_chunked(600, 200, 2, |range| async move {
            if range.start == 200 {
                bail!("simulated batch failure");
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(range.collect::<Vec<usize>>())
        })
        .await;

        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("chunk 200..400"));
    }

    #[tokio::test]
    async fn test_run_chunked_rejects_short_chunk_output() {
        let result = run_chunked(100, 50, 4, |range| async move {
            // Drop the last item of each chunk.
            Ok(range.collect::<Vec<usize>>()[..49].to_vec())
        })
        .await;
        assert!(result.is_err());
    }
}
