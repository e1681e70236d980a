//! Splitting a request budget across workers.
use std::num::NonZeroUsize;

/// Split `total` operations across `workers`.
///
/// Every worker gets `total / workers`; the first `total % workers` workers get one more. The
/// shares always sum to `total`, and workers beyond `total` get nothing.
pub fn partition(total: usize, workers: NonZeroUsize) -> Vec<usize> {
    let workers = workers.get();
    let base = total / workers;
    let remainder = total % workers;

    (0..workers)
        .map(|idx| if idx < remainder { base + 1 } else { base })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn remainder_goes_to_first_workers() {
        assert_eq!(partition(10, nz(3)), vec![4, 3, 3]);
        assert_eq!(partition(11, nz(3)), vec![4, 4, 3]);
        assert_eq!(partition(12, nz(3)), vec![4, 4, 4]);
    }

    #[test]
    fn more_workers_than_requests() {
        assert_eq!(partition(2, nz(5)), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn nothing_to_do() {
        assert_eq!(partition(0, nz(4)), vec![0, 0, 0, 0]);
    }

    #[test]
    fn single_worker_takes_everything() {
        assert_eq!(partition(1000, nz(1)), vec![1000]);
    }

    #[test]
    fn shares_are_fair() {
        for total in 0..64 {
            for workers in 1..17 {
                let shares = partition(total, nz(workers));
                let remainder = total % workers;

                assert_eq!(shares.len(), workers);
                assert_eq!(shares.iter().sum::<usize>(), total);

                let max = *shares.iter().max().unwrap();
                let min = *shares.iter().min().unwrap();
                assert!(max - min <= 1, "{total}/{workers}: {shares:?}");
                assert!(shares[..remainder].iter().all(|s| *s == max));
                assert!(shares[remainder..].iter().all(|s| *s == total / workers));
            }
        }
    }
}
