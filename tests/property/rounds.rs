//! Property tests for round-robin host selection.
//!
//! Invariant tested: for any number of hosts and any number of sequential
//! selections (no host ever disabled), every host's share of selections is
//! within one of every other host's share -- round robin never starves or
//! over-serves a host relative to the others.

use proptest::prelude::*;
use roundbreaker::Rounds;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn selection_counts_never_differ_by_more_than_one(host_count in 1usize..8, picks in 1usize..200) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let hosts: Vec<_> = (0..host_count)
                .map(|i| roundbreaker::Host::new("http", format!("h{i}"), 1_000_000, Duration::from_secs(9999)))
                .collect();
            let rounds = Rounds::new(hosts);
            let deadline = Instant::now() + Duration::from_secs(5);

            let mut counts: HashMap<String, usize> = HashMap::new();
            for _ in 0..picks {
                let host = rounds.next(deadline).await.unwrap();
                *counts.entry(host.authority().to_string()).or_insert(0) += 1;
            }

            let min = *counts.values().min().unwrap();
            let max = *counts.values().max().unwrap();
            prop_assert!(max - min <= 1, "counts spread too far: {:?}", counts);
            Ok(())
        })?;
    }
}
