#![cfg(feature = "backend_wgpu")]

use flips_and_disperses::sort::driver::ResetError;
use flips_and_disperses::sort::network::total_steps;
use flips_and_disperses::sort::{Engine, SortDriver};
use std::time::Duration;

/// Exercises reset (same and changed element counts, invalid counts) and the
/// timed auto-advance mode, including an interval change mid-run.
///
/// Machines without a usable GPU adapter skip.
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

            let mut rng = fastrand::Rng::with_seed(0x5027_BEEF);
            let mut small: Vec<u32> = (0..16).collect();
            rng.shuffle(&mut small);
            let driver = SortDriver::new(device, &small, "sort_resize")
                .await
                .expect("Failed to create sort driver");

            // Partially run, then grow the sort; everything must restart.
            for _ in 0..3 {
                driver.execute_step().await.expect("step failed");
            }
            assert_eq!(driver.current_state().step_index, 3);

            let mut large: Vec<u32> = (0..64).collect();
            rng.shuffle(&mut large);
            driver.reset(&large).await.expect("reset failed");
            let state = driver.current_state();
            assert_eq!(state.step_index, 0);
            assert_eq!(state.total_steps, total_steps(64));
            assert_eq!(driver.element_count(), 64);
            assert_eq!(driver.swaps_observed(), 0);

            driver.complete_sort().await.expect("complete_sort failed");
            let expected: Vec<u32> = (0..64).collect();
            assert_eq!(driver.elements(), expected);

            // Counts the network can't run are rejected, not rounded.
            let odd = vec![5u32; 12];
            match driver.reset(&odd).await {
                Err(ResetError::NotPowerOfTwo(12)) => {}
                other => panic!("expected NotPowerOfTwo, got {other:?}"),
            }
            let tiny = vec![5u32];
            match driver.reset(&tiny).await {
                Err(ResetError::TooFewElements(1)) => {}
                other => panic!("expected TooFewElements, got {other:?}"),
            }
            // The failed resets left the completed sort alone.
            assert!(driver.is_complete());
            assert_eq!(driver.elements(), expected);

            // Auto-advance drives the sort to completion unattended; changing
            // the interval mid-run reschedules without double-stepping.
            let mut elements: Vec<u32> = (0..64).collect();
            rng.shuffle(&mut elements);
            driver.reset(&elements).await.expect("reset failed");
            driver.start_auto_advance(Duration::from_millis(50));
            driver.start_auto_advance(Duration::from_millis(2));
            let mut waited = 0;
            while !driver.is_complete() {
                portable_async_sleep::async_sleep(Duration::from_millis(10)).await;
                waited += 1;
                assert!(waited < 1000, "auto-advance never completed the sort");
            }
            driver.stop_auto_advance();
            assert_eq!(driver.current_state().step_index, total_steps(64));
            // A terminal complete_sort records nothing; it just refreshes the
            // host mirror, which may trail the last auto-step.
            driver.complete_sort().await.expect("readback refresh failed");
            assert_eq!(driver.elements(), expected);
        },
        "sort_resize",
    );
}
