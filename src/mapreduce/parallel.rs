use std::panic;
use std::thread;

use tracing::debug;

use super::Pair;
use crate::error::{MapReduceError, Result};

/// One scoped thread per pair; returns after every worker has finished.
pub(super) fn map(pairs: &mut [Pair]) -> Result<()> {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(pairs.len());
        for (id, pair) in pairs.iter_mut().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("mapreduce-worker-{id}"))
                .spawn_scoped(scope, move || {
                    let words = pair.drain();
                    debug!(worker = id, words, "worker done");
                })
                .map_err(MapReduceError::ThreadSpawn)?;
            handles.push(handle);
        }

        for handle in handles {
            if let Err(payload) = handle.join() {
                panic::resume_unwind(payload);
            }
        }
        Ok(())
    })
}
