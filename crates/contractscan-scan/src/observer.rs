//! Observers receive a snapshot after every session transition.

use contractscan_core::ScanSnapshot;

pub trait ScanObserver: Send + Sync {
    fn on_update(&self, snapshot: &ScanSnapshot);
}

impl<F> ScanObserver for F
where
    F: Fn(&ScanSnapshot) + Send + Sync,
{
    fn on_update(&self, snapshot: &ScanSnapshot) {
        self(snapshot)
    }
}
