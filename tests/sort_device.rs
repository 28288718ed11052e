#![cfg(feature = "backend_wgpu")]

use flips_and_disperses::bindings::SpatialEntry;
use flips_and_disperses::sort::network::total_steps;
use flips_and_disperses::sort::{Engine, SortDriver};

/// Runs the engine's core contract against a real adapter: a stepped sort
/// finishes in exactly the predicted number of steps with sorted output, the
/// terminal state is idempotent, and composite payloads never separate from
/// their keys.
///
/// Machines without a usable GPU adapter skip (the engine cannot be
/// exercised without one).
#[test]
fn main() {
    test_executors::spawn_local(
        async move {
            let engine = match Engine::for_compute().await {
                Ok(engine) => engine,
                Err(e) => {
                    println!("No usable GPU adapter; skipping device test ({e})");
                    return;
                }
            };
            let device = engine.bound_device();

            // Stepped sort of a reversed array, counting every step.
            let n = 1024u32;
            let initial: Vec<u32> = (0..n).rev().collect();
            let driver = SortDriver::new(device, &initial, "sort_device reversed")
                .await
                .expect("Failed to create sort driver");
            let expected_steps = total_steps(n);
            let mut steps = 0;
            while driver.execute_step().await.expect("step failed") {
                steps += 1;
                assert!(steps <= expected_steps, "sort overran its step budget");
            }
            assert_eq!(steps, expected_steps);
            assert!(driver.is_complete());
            let expected: Vec<u32> = (0..n).collect();
            assert_eq!(driver.elements(), expected);
            assert!(driver.swaps_observed() > 0);

            // Stepping past the terminal state changes nothing.
            let terminal = driver.current_state();
            for _ in 0..3 {
                assert!(!driver.execute_step().await.expect("no-op step failed"));
            }
            assert_eq!(driver.current_state(), terminal);
            assert_eq!(driver.elements(), expected);

            // Full-speed sort of shuffled records; index/hash ride with the key.
            let mut rng = fastrand::Rng::with_seed(0x0D15_FE47);
            let entries: Vec<SpatialEntry> = (0..512u32)
                .map(|i| {
                    let key = rng.u32(..4096);
                    SpatialEntry {
                        index: i,
                        hash: key ^ 0xA5A5_A5A5,
                        key,
                    }
                })
                .collect();
            let original = entries.clone();
            let driver = SortDriver::new(device, &entries, "sort_device spatial")
                .await
                .expect("Failed to create spatial sort driver");
            driver.complete_sort().await.expect("complete_sort failed");
            assert!(driver.is_complete());
            let sorted = driver.elements();
            for window in sorted.windows(2) {
                assert!(window[0].key <= window[1].key, "keys out of order");
            }
            for entry in &sorted {
                assert_eq!(
                    *entry, original[entry.index as usize],
                    "payload separated from its key"
                );
            }
        },
        "sort_device",
    );
}
