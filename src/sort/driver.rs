// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/*! The host-side step driver.

A [`SortDriver`] owns the sort's state machine and the device resources
sized to the element count.  Each executed step writes the current phase
parameters to the device, issues exactly one dispatch covering every
element pair, optionally reads the result back for display, and advances
the state machine.  The transition is applied at record time, before any
suspension, so a failed readback can never desynchronize the sort.

Three driving modes:

* single-step, via [`execute_step`](SortDriver::execute_step);
* timed auto-advance, via [`start_auto_advance`](SortDriver::start_auto_advance)
  /[`stop_auto_advance`](SortDriver::stop_auto_advance); restarting with a
  new interval cancels the old timer before the new one fires;
* full speed, via [`complete_sort`](SortDriver::complete_sort), which
  records every remaining dispatch back-to-back and reads back once.
*/

use crate::bindings::SortablePayload;
use crate::imp;
use crate::sort::BoundDevice;
use crate::sort::network::{self, SortState, display_grid};
use std::fmt::Formatter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/**
Drives a bitonic sort of one buffer of payloads to completion, one
comparison pass at a time.

Cloning is cheap and clones share the same sort; this is how the
auto-advance timer and a UI layer observe one engine.
*/
pub struct SortDriver<Payload: SortablePayload> {
    shared: Arc<Shared<Payload>>,
}

impl<Payload: SortablePayload> Clone for SortDriver<Payload> {
    fn clone(&self) -> Self {
        SortDriver {
            shared: self.shared.clone(),
        }
    }
}

struct Shared<Payload: SortablePayload> {
    inner: Mutex<Inner<Payload>>,
    ///Bumped to cancel whichever auto-advance timer is running.
    auto_generation: AtomicU64,
}

struct Inner<Payload: SortablePayload> {
    pass: Arc<imp::SortPass<Payload>>,
    state: SortState,
    element_count: u32,
    group_size: u32,
    grid: (u32, u32),
    ///Host mirror of the device elements, one readback behind at worst.
    elements: Vec<Payload>,
    swaps: u32,
    device: Arc<BoundDevice>,
    debug_name: String,
}

///Wraps a backend resource failure.
#[derive(Debug)]
pub struct ResourceError(pub(crate) imp::Error);
impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for ResourceError {}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ResetError {
    ///The network's step-count formula only holds for power-of-two counts,
    /// so anything else is rejected outright rather than truncated.
    #[error("Can't sort {0} elements; the network requires a power-of-two count")]
    NotPowerOfTwo(usize),
    #[error("Can't sort {0} elements; at least 2 are required")]
    TooFewElements(usize),
    #[error("Can't allocate sort resources {0}")]
    Resource(ResourceError),
}

impl From<imp::Error> for ResetError {
    fn from(e: imp::Error) -> Self {
        ResetError::Resource(ResourceError(e))
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StepError {
    #[error("Can't read back sort results {0}")]
    Readback(ResourceError),
}

fn validate_element_count(len: usize) -> Result<u32, ResetError> {
    if len < 2 {
        return Err(ResetError::TooFewElements(len));
    }
    if !len.is_power_of_two() || len > u32::MAX as usize {
        return Err(ResetError::NotPowerOfTwo(len));
    }
    Ok(len as u32)
}

impl<Payload: SortablePayload> SortDriver<Payload> {
    /**
    Creates a driver over `initial`, unsorted.

    `initial.len()` must be a power of two of at least 2; the driver never
    rounds or truncates.  Buffer allocation failures (for instance a count
    whose bytes exceed the device's storage-binding limit) surface here.
    */
    pub async fn new(
        bound_device: &Arc<BoundDevice>,
        initial: &[Payload],
        debug_name: &str,
    ) -> Result<Self, ResetError> {
        let element_count = validate_element_count(initial.len())?;
        let pass = Arc::new(
            imp::SortPass::new(bound_device.clone(), initial, debug_name).await?,
        );
        let group_size = pass.group_size();
        let count = element_count as u64;
        let group = group_size as u64;
        let steps = network::total_steps(element_count) as u64;
        logwise::info_sync!(
            "Sort of {count} elements in groups of {group}, {steps} steps",
            count = count,
            group = group,
            steps = steps
        );
        Ok(SortDriver {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    pass,
                    state: SortState::new(element_count),
                    element_count,
                    group_size,
                    grid: display_grid(element_count),
                    elements: initial.to_vec(),
                    swaps: 0,
                    device: bound_device.clone(),
                    debug_name: debug_name.to_string(),
                }),
                auto_generation: AtomicU64::new(0),
            }),
        })
    }

    /**
    Restarts the sort over new contents.

    A changed element count reallocates every device buffer; the same count
    reuses them.  Either way the state machine returns to the initial
    `FLIP_LOCAL` step and the swap counter clears.
    */
    pub async fn reset(&self, initial: &[Payload]) -> Result<(), ResetError> {
        let element_count = validate_element_count(initial.len())?;
        self.stop_auto_advance();
        let (reusable, device, debug_name) = {
            let inner = self.shared.inner.lock().expect("driver poisoned");
            (
                (inner.element_count == element_count).then(|| inner.pass.clone()),
                inner.device.clone(),
                inner.debug_name.clone(),
            )
        };
        let pass = match reusable {
            Some(pass) => {
                pass.write_elements(initial);
                pass.clear_swap_counter();
                pass
            }
            None => Arc::new(imp::SortPass::new(device, initial, &debug_name).await?),
        };
        let group_size = pass.group_size();
        let mut inner = self.shared.inner.lock().expect("driver poisoned");
        inner.pass = pass;
        inner.state = SortState::new(element_count);
        inner.element_count = element_count;
        inner.group_size = group_size;
        inner.grid = display_grid(element_count);
        inner.elements = initial.to_vec();
        inner.swaps = 0;
        Ok(())
    }

    /**
    Executes one comparison pass and advances the state machine.

    Returns `Ok(true)` if a step ran, `Ok(false)` if the sort had already
    completed (calling past the terminal state is a no-op, never a
    re-dispatch).  The per-step readback is diagnostic: when an earlier
    readback still holds the staging buffer the step runs without one and
    the host mirror lags until the next step.
    */
    pub async fn execute_step(&self) -> Result<bool, StepError> {
        let (pass, armed) = {
            let mut inner = self.shared.inner.lock().expect("driver poisoned");
            if inner.state.is_terminal() {
                return Ok(false);
            }
            let armed = inner.pass.try_begin_readback();
            if !armed {
                logwise::warn_sync!("Sort readback still in flight; skipping display copy");
            }
            let state = inner.state;
            let grid = inner.grid;
            inner.pass.record_step(state.phase, state.block_height, grid, armed);
            inner.state = state.advanced(inner.element_count, inner.group_size);
            (inner.pass.clone(), armed)
        };
        if armed {
            let (elements, swaps) = pass
                .finish_readback()
                .await
                .map_err(|e| StepError::Readback(ResourceError(e)))?;
            let mut inner = self.shared.inner.lock().expect("driver poisoned");
            //a reset may have replaced the pass while we were waiting
            if Arc::ptr_eq(&inner.pass, &pass) {
                inner.elements = elements;
                inner.swaps = swaps;
            }
        }
        Ok(true)
    }

    /**
    Runs every remaining step back-to-back, then reads the result back once.

    No intermediate readbacks are scheduled, so this is the fastest way to
    a sorted buffer when nobody is watching the intermediate states.
    */
    pub async fn complete_sort(&self) -> Result<(), StepError> {
        let pass = {
            let mut inner = self.shared.inner.lock().expect("driver poisoned");
            while !inner.state.is_terminal() {
                let state = inner.state;
                let grid = inner.grid;
                inner
                    .pass
                    .record_step(state.phase, state.block_height, grid, false);
                inner.state = state.advanced(inner.element_count, inner.group_size);
            }
            inner.pass.clone()
        };
        //wait out any straggling display readback before claiming staging
        while !pass.try_begin_readback() {
            portable_async_sleep::async_sleep(Duration::from_millis(1)).await;
        }
        pass.record_staging_copy();
        let (elements, swaps) = pass
            .finish_readback()
            .await
            .map_err(|e| StepError::Readback(ResourceError(e)))?;
        let mut inner = self.shared.inner.lock().expect("driver poisoned");
        if Arc::ptr_eq(&inner.pass, &pass) {
            inner.elements = elements;
            inner.swaps = swaps;
        }
        Ok(())
    }

    /**
    Steps the sort on a repeating interval until it completes.

    Calling again, with the same or a different interval, cancels the
    running timer before scheduling the new one, so two timers can never
    drive the sort at once.  The timer also stops on completion, on a
    readback error, or when every driver clone is dropped.
    */
    pub fn start_auto_advance(&self, interval: Duration) {
        let generation = self.shared.auto_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let weak = Arc::downgrade(&self.shared);
        std::thread::Builder::new()
            .name("sort auto-advance".to_string())
            .spawn(move || {
                loop {
                    std::thread::sleep(interval);
                    let Some(shared) = weak.upgrade() else { return };
                    if shared.auto_generation.load(Ordering::Acquire) != generation {
                        return;
                    }
                    let driver = SortDriver { shared };
                    match test_executors::sleep_on(driver.execute_step()) {
                        Ok(true) => {}
                        Ok(false) => return,
                        Err(e) => {
                            logwise::warn_sync!(
                                "Sort auto-advance stopped: {err}",
                                err = e.to_string()
                            );
                            return;
                        }
                    }
                }
            })
            .expect("Failed to spawn auto-advance thread");
    }

    ///Cancels the auto-advance timer.  Idle timers make this a no-op.
    pub fn stop_auto_advance(&self) {
        self.shared.auto_generation.fetch_add(1, Ordering::AcqRel);
    }

    ///Whether the full network has been applied.
    pub fn is_complete(&self) -> bool {
        self.shared
            .inner
            .lock()
            .expect("driver poisoned")
            .state
            .is_terminal()
    }

    ///The state machine's current contents: next phase, block height, and progress.
    pub fn current_state(&self) -> SortState {
        self.shared.inner.lock().expect("driver poisoned").state
    }

    /**
    Host mirror of the element buffer.

    Refreshed by each stepped readback; after [`complete_sort`](Self::complete_sort)
    or once [`is_complete`](Self::is_complete) reports true following a
    stepped run, this is the fully sorted data.
    */
    pub fn elements(&self) -> Vec<Payload> {
        self.shared
            .inner
            .lock()
            .expect("driver poisoned")
            .elements
            .clone()
    }

    ///Swaps the kernel has performed since the last reset.  Diagnostic
    /// only; termination comes from the step count, never from here.
    pub fn swaps_observed(&self) -> u32 {
        self.shared.inner.lock().expect("driver poisoned").swaps
    }

    ///Element count of the current sort.
    pub fn element_count(&self) -> u32 {
        self.shared
            .inner
            .lock()
            .expect("driver poisoned")
            .element_count
    }

    ///The invocation-group size the kernel runs with.
    pub fn group_size(&self) -> u32 {
        self.shared.inner.lock().expect("driver poisoned").group_size
    }

    ///Display-cell layout for the current element count.
    pub fn grid(&self) -> (u32, u32) {
        self.shared.inner.lock().expect("driver poisoned").grid
    }

    ///The index `element` will be compared against in the next step, for
    /// hover highlighting.  Elements pair with themselves once complete.
    pub fn swap_partner_of(&self, element: u32) -> u32 {
        let inner = self.shared.inner.lock().expect("driver poisoned");
        network::swap_partner(&inner.state, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsortable_counts() {
        assert!(matches!(
            validate_element_count(0),
            Err(ResetError::TooFewElements(0))
        ));
        assert!(matches!(
            validate_element_count(1),
            Err(ResetError::TooFewElements(1))
        ));
        assert!(matches!(
            validate_element_count(12),
            Err(ResetError::NotPowerOfTwo(12))
        ));
        assert!(matches!(
            validate_element_count(1000),
            Err(ResetError::NotPowerOfTwo(1000))
        ));
        assert_eq!(validate_element_count(2).unwrap(), 2);
        assert_eq!(validate_element_count(1024).unwrap(), 1024);
    }

    #[test]
    fn reset_errors_describe_the_problem() {
        let e = validate_element_count(12).unwrap_err();
        let message = e.to_string();
        assert!(message.contains("12"));
        assert!(message.contains("power-of-two"));
    }
}
