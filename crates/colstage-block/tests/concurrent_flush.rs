//! Integration test: independent buffers flushing on separate threads
//! into one shared metrics counter.

use std::sync::{Arc, Mutex};
use std::thread;

use colstage_block::BlockBuffer;
use colstage_core::{MemoryPool, SystemPool, WriterMetrics};
use colstage_test_utils::{pattern, SharedSink};

const COLUMNS: usize = 8;
const ROUNDS: usize = 25;

#[test]
fn shared_metrics_sum_every_buffer() {
    let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());
    let metrics = WriterMetrics::new();
    let outputs: Vec<Mutex<Vec<u8>>> = (0..COLUMNS).map(|_| Mutex::new(Vec::new())).collect();

    let per_thread: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..COLUMNS)
            .map(|col| {
                let pool = Arc::clone(&pool);
                let metrics = &metrics;
                let out = &outputs[col];
                s.spawn(move || {
                    let mut issued = 0;
                    for round in 0..ROUNDS {
                        let mut buf = BlockBuffer::new(Arc::clone(&pool), 32).unwrap();
                        for _ in 0..=col {
                            let mut region = buf.next_block().unwrap();
                            let bytes = pattern(region.size(), round as u8);
                            region.copy_from_slice(&bytes);
                        }
                        let mut sink = SharedSink::new(50, out);
                        issued += buf.write_to(&mut sink, Some(metrics)).unwrap();
                    }
                    issued
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let total: u64 = per_thread.iter().sum();
    assert_eq!(metrics.io_count(), total);

    for (col, out) in outputs.iter().enumerate() {
        let bytes = out.lock().unwrap();
        assert_eq!(bytes.len(), ROUNDS * 32 * (col + 1));
        // Each flush of (col + 1) * 32 bytes through 50-byte chunks.
        let per_flush = ((col + 1) * 32).div_ceil(50) as u64;
        assert_eq!(per_thread[col], per_flush * ROUNDS as u64);
    }
}
