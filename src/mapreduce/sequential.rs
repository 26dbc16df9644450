use tracing::debug;

use super::Pair;

/// Drain every pair on the calling thread, in order.
pub(super) fn map(pairs: &mut [Pair]) {
    for (id, pair) in pairs.iter_mut().enumerate() {
        let words = pair.drain();
        debug!(worker = id, words, "sequential pass done");
    }
}
