/*
 * @file parallel.rs
 * @author garbled_cuckoo authors
 * @copyright 2026 garbled_cuckoo authors
 *
 * Optional fan-out of independent per-item work.
 */

#[cfg(feature="threading")]
use rayon::prelude::*;

/** Map `f` over `items`, on the rayon pool if `parallel` is set */
#[cfg(feature="threading")]
pub(crate) fn map_maybe_parallel<T,U,F>(items: &[T], parallel: bool, f: F) -> Vec<U>
where T: Sync, U: Send, F: Fn(&T) -> U + Sync + Send {
    if parallel {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/** Map `f` over `items`.  Without threading support, always sequential. */
#[cfg(not(feature="threading"))]
pub(crate) fn map_maybe_parallel<T,U,F>(items: &[T], _parallel: bool, f: F) -> Vec<U>
where T: Sync, U: Send, F: Fn(&T) -> U + Sync + Send {
    items.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use crate::parallel::map_maybe_parallel;

    #[test]
    fn test_order_preserved() {
        let items : Vec<u64> = (0..1000).collect();
        for parallel in [false, true] {
            let out = map_maybe_parallel(&items, parallel, |x| x*x);
            assert_eq!(out, items.iter().map(|x| x*x).collect::<Vec<_>>());
        }
    }
}
