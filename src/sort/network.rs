// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/*! The bitonic sorting network, host side.

Everything in this module is pure: the step-count formula, the per-step
phase/block-height state machine, and the index derivation the kernel uses
to pair elements.  The device kernel and the host reference executor
([`apply_step`]) both implement the same contract, so the network can be
tested (and previewed by a visualization host) without a device.

A sort of `N` elements proceeds through `log2(N) * (log2(N)+1) / 2`
sequential steps.  Each step is a *flip* (mirrored pairing, which merges two
sorted runs into one bitonic sequence) or a *disperse* (adjacent-half
pairing, which sorts a bitonic sequence), at some power-of-two block height.
Block heights at or below twice the invocation-group size run in the
kernel's *local* variant against workgroup shared storage; larger block
heights must run *global* against main memory.
*/

use crate::bindings::SortablePayload;

/**
The kind of comparison pass the kernel runs next.

Codes match the generated kernel's `switch`; [`Step::None`] means the
network has been fully applied and the data is sorted.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    None,
    FlipLocal,
    DisperseLocal,
    FlipGlobal,
    DisperseGlobal,
}

impl Step {
    ///The `u32` code written into the kernel's config record.
    pub fn code(self) -> u32 {
        match self {
            Step::None => 0,
            Step::FlipLocal => 1,
            Step::DisperseLocal => 2,
            Step::FlipGlobal => 3,
            Step::DisperseGlobal => 4,
        }
    }

    ///Whether this step stages elements through workgroup shared storage.
    pub fn is_local(self) -> bool {
        matches!(self, Step::FlipLocal | Step::DisperseLocal)
    }

    ///Whether this step is a flip (mirrored pairing).
    pub fn is_flip(self) -> bool {
        matches!(self, Step::FlipLocal | Step::FlipGlobal)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::None => "NONE",
            Step::FlipLocal => "FLIP_LOCAL",
            Step::DisperseLocal => "DISPERSE_LOCAL",
            Step::FlipGlobal => "FLIP_GLOBAL",
            Step::DisperseGlobal => "DISPERSE_GLOBAL",
        };
        f.write_str(s)
    }
}

/**
Total sequential steps needed to sort `n` elements.

`n` must be a power of two; the formula is `k*(k+1)/2` for `k = log2(n)`
and is meaningless for other lengths.
*/
pub fn total_steps(n: u32) -> u32 {
    debug_assert!(n.is_power_of_two(), "element count must be a power of two");
    let k = n.trailing_zeros();
    k * (k + 1) / 2
}

/**
The step driver's complete mutable state.

`phase`/`block_height` describe the *next* step to execute.  The state
advances by [`SortState::advanced`] exactly once per executed step and is
terminal (`phase == None`, `block_height == 0`) once the network has been
fully applied.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub phase: Step,
    pub block_height: u32,
    ///Largest block height the flip cascade has established so far.
    pub highest_block_height: u32,
    ///Steps executed since the last reset.
    pub step_index: u32,
    pub total_steps: u32,
}

impl SortState {
    ///State at the start of a sort of `n` elements.
    pub fn new(n: u32) -> Self {
        SortState {
            phase: Step::FlipLocal,
            block_height: 2,
            highest_block_height: 2,
            step_index: 0,
            total_steps: total_steps(n),
        }
    }

    ///Whether the network has been fully applied.
    pub fn is_terminal(&self) -> bool {
        self.phase == Step::None
    }

    /**
    The state after executing the step this state describes.

    `n` is the element count, `group_size` the invocation-group size the
    kernel runs with.  A flip establishes a bitonic sequence of the current
    `highest_block_height`; its disperse cascade then halves the block
    height until it bottoms out at 1, at which point the next flip doubles
    the established size.  The sort is complete when the established size
    would pass `2*n`.

    Advancing a terminal state returns it unchanged.
    */
    pub fn advanced(self, n: u32, group_size: u32) -> SortState {
        if self.is_terminal() {
            return self;
        }
        let local_limit = 2 * group_size;
        let mut next = self;
        next.step_index += 1;
        next.block_height /= 2;
        if next.block_height == 1 {
            next.highest_block_height *= 2;
            if next.highest_block_height == 2 * n {
                next.phase = Step::None;
                next.block_height = 0;
            } else {
                next.block_height = next.highest_block_height;
                next.phase = if next.highest_block_height > local_limit {
                    Step::FlipGlobal
                } else {
                    Step::FlipLocal
                };
            }
        } else {
            next.phase = if next.block_height > local_limit {
                Step::DisperseGlobal
            } else {
                Step::DisperseLocal
            };
        }
        next
    }
}

/**
Element pair compared by invocation `invocation` of a flip step.

The pairing is mirrored within the block: first element against last,
second against second-to-last, and so on.  The returned pair is ordered
(low index first).
*/
pub fn flip_pair(invocation: u32, block_height: u32) -> (u32, u32) {
    let block_offset = (2 * invocation / block_height) * block_height;
    let half_height = block_height / 2;
    let low = invocation % half_height;
    let high = block_height - (invocation % half_height) - 1;
    (block_offset + low, block_offset + high)
}

/**
Element pair compared by invocation `invocation` of a disperse step.

Each element in the lower half of the block pairs with the element
`half_height` above it.
*/
pub fn disperse_pair(invocation: u32, block_height: u32) -> (u32, u32) {
    let block_offset = (2 * invocation / block_height) * block_height;
    let half_height = block_height / 2;
    let low = invocation % half_height;
    (block_offset + low, block_offset + low + half_height)
}

/**
The index `element` would be compared against by the step `state` describes.

Visualization hosts use this to highlight the hovered element's partner
before the step runs.  In the terminal state an element has no partner and
pairs with itself.
*/
pub fn swap_partner(state: &SortState, element: u32) -> u32 {
    if state.is_terminal() {
        return element;
    }
    let block_height = state.block_height;
    if state.phase.is_flip() {
        let block = element / block_height + 1;
        block_height * block - (element % block_height) - 1
    } else {
        let half_height = block_height / 2;
        if element % block_height < half_height {
            element + half_height
        } else {
            element - half_height
        }
    }
}

/**
Near-square cell layout for displaying `n` elements.

Width is `sqrt(n)` when that's an even integer, otherwise `sqrt(n/2)`;
height is whatever covers the rest.  Returns `(width, height)`.
*/
pub fn display_grid(n: u32) -> (u32, u32) {
    let root = (n as f64).sqrt();
    let width = if root.fract() == 0.0 && (root as u32) % 2 == 0 {
        root as u32
    } else {
        ((n / 2) as f64).sqrt() as u32
    };
    let width = width.max(1);
    (width, n / width)
}

/**
Applies one step of the network to a host-side slice.

This is the executable reference for the device kernel: `len/2`
conceptual invocations each derive a pair by the step's rule and swap the
whole elements iff the higher-indexed element's key is strictly less.
Equal keys never swap.  Returns the number of swaps performed.

`elements.len()` must be a power of two and `state` non-terminal.
*/
pub fn apply_step<P: SortablePayload>(state: &SortState, elements: &mut [P]) -> u32 {
    assert!(!state.is_terminal(), "no step to apply in terminal state");
    let mut swaps = 0;
    for invocation in 0..(elements.len() as u32) / 2 {
        let (a, b) = if state.phase.is_flip() {
            flip_pair(invocation, state.block_height)
        } else {
            disperse_pair(invocation, state.block_height)
        };
        if elements[b as usize].sort_key() < elements[a as usize].sort_key() {
            elements.swap(a as usize, b as usize);
            swaps += 1;
        }
    }
    swaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::SpatialEntry;

    ///Runs the network to completion on the host, returning steps executed.
    fn sort_to_completion<P: SortablePayload>(elements: &mut [P], group_size: u32) -> u32 {
        let n = elements.len() as u32;
        let mut state = SortState::new(n);
        let mut steps = 0;
        while !state.is_terminal() {
            apply_step(&state, elements);
            state = state.advanced(n, group_size);
            steps += 1;
        }
        steps
    }

    #[test]
    fn step_count_formula() {
        assert_eq!(total_steps(2), 1);
        assert_eq!(total_steps(4), 3);
        assert_eq!(total_steps(8), 6);
        assert_eq!(total_steps(16), 10);
        assert_eq!(total_steps(1024), 55);
    }

    #[test]
    fn termination_is_exact() {
        for k in 1..=10 {
            let n = 1u32 << k;
            let mut state = SortState::new(n);
            let mut executed = 0;
            while !state.is_terminal() {
                state = state.advanced(n, 256);
                executed += 1;
                assert!(executed <= total_steps(n), "advanced past the step budget");
            }
            assert_eq!(executed, total_steps(n));
            assert_eq!(state.block_height, 0);
            assert_eq!(state.step_index, total_steps(n));
        }
    }

    #[test]
    fn terminal_state_is_fixed() {
        let n = 16;
        let mut state = SortState::new(n);
        while !state.is_terminal() {
            state = state.advanced(n, 4);
        }
        let terminal = state;
        for _ in 0..5 {
            state = state.advanced(n, 4);
            assert_eq!(state, terminal);
        }
    }

    #[test]
    fn phase_sequence_16_elements_group_of_4() {
        // Executed steps for N=16, G=4 (local limit 8), per the transition rule.
        let expected = [
            (Step::FlipLocal, 2),
            (Step::FlipLocal, 4),
            (Step::DisperseLocal, 2),
            (Step::FlipLocal, 8),
            (Step::DisperseLocal, 4),
            (Step::DisperseLocal, 2),
            (Step::FlipGlobal, 16),
            (Step::DisperseLocal, 8),
            (Step::DisperseLocal, 4),
            (Step::DisperseLocal, 2),
        ];
        let n = 16;
        let mut state = SortState::new(n);
        let mut executed = Vec::new();
        while !state.is_terminal() {
            executed.push((state.phase, state.block_height));
            state = state.advanced(n, 4);
        }
        assert_eq!(executed, expected);
    }

    #[test]
    fn local_global_boundary() {
        // G=4: any block height above 8 must run global, everything else local.
        let n = 64;
        let group_size = 4;
        let mut state = SortState::new(n);
        while !state.is_terminal() {
            if state.block_height > 2 * group_size {
                assert!(
                    matches!(state.phase, Step::FlipGlobal | Step::DisperseGlobal),
                    "block height {} ran {}",
                    state.block_height,
                    state.phase
                );
            } else {
                assert!(
                    matches!(state.phase, Step::FlipLocal | Step::DisperseLocal),
                    "block height {} ran {}",
                    state.block_height,
                    state.phase
                );
            }
            state = state.advanced(n, group_size);
        }
    }

    #[test]
    fn flip_pairing_is_mirrored() {
        assert_eq!(flip_pair(0, 4), (0, 3));
        assert_eq!(flip_pair(1, 4), (1, 2));
        assert_eq!(flip_pair(2, 4), (4, 7));
        assert_eq!(flip_pair(3, 4), (5, 6));
        assert_eq!(flip_pair(0, 2), (0, 1));
    }

    #[test]
    fn disperse_pairing_is_adjacent_half() {
        assert_eq!(disperse_pair(0, 4), (0, 2));
        assert_eq!(disperse_pair(1, 4), (1, 3));
        assert_eq!(disperse_pair(2, 4), (4, 6));
        assert_eq!(disperse_pair(3, 4), (5, 7));
    }

    #[test]
    fn pairs_are_disjoint_within_a_step() {
        // No two invocations of one dispatch may touch the same element.
        for &block_height in &[2u32, 4, 8, 16] {
            for flip in [true, false] {
                let mut seen = std::collections::HashSet::new();
                for invocation in 0..8 {
                    let (a, b) = if flip {
                        flip_pair(invocation, block_height)
                    } else {
                        disperse_pair(invocation, block_height)
                    };
                    assert!(seen.insert(a), "element {a} paired twice");
                    assert!(seen.insert(b), "element {b} paired twice");
                }
            }
        }
    }

    #[test]
    fn swap_partner_matches_pairing() {
        let state = SortState {
            phase: Step::FlipLocal,
            block_height: 4,
            highest_block_height: 4,
            step_index: 0,
            total_steps: 10,
        };
        // Partner relation is symmetric and mirrors the flip pairing.
        assert_eq!(swap_partner(&state, 0), 3);
        assert_eq!(swap_partner(&state, 3), 0);
        assert_eq!(swap_partner(&state, 5), 6);

        let state = SortState {
            phase: Step::DisperseLocal,
            block_height: 4,
            ..state
        };
        assert_eq!(swap_partner(&state, 0), 2);
        assert_eq!(swap_partner(&state, 2), 0);
        assert_eq!(swap_partner(&state, 5), 7);

        let mut terminal = state;
        terminal.phase = Step::None;
        terminal.block_height = 0;
        assert_eq!(swap_partner(&terminal, 5), 5);
    }

    #[test]
    fn display_grid_shapes() {
        assert_eq!(display_grid(16), (4, 4));
        assert_eq!(display_grid(8), (2, 4));
        assert_eq!(display_grid(4), (2, 2));
        assert_eq!(display_grid(512), (16, 32));
    }

    #[test]
    fn sorts_the_reference_scenario() {
        // All-local sort: G=8 means every block height up to 16 stays local.
        let mut elements: [u32; 8] = [5, 3, 8, 1, 9, 2, 7, 4];
        let steps = sort_to_completion(&mut elements, 8);
        assert_eq!(steps, 6);
        assert_eq!(elements, [1, 2, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn sorts_across_group_boundaries() {
        // Small group forces global phases.
        let mut elements: Vec<u32> = (0..64u32).rev().collect();
        sort_to_completion(&mut elements, 4);
        let expected: Vec<u32> = (0..64).collect();
        assert_eq!(elements, expected);
    }

    #[test]
    fn sorts_random_permutations() {
        let mut rng = fastrand::Rng::with_seed(0x5EED_CAFE);
        for k in 1..=8 {
            let n = 1u32 << k;
            for &group_size in &[2u32, 4, 256] {
                let mut elements: Vec<u32> = (0..n).map(|_| rng.u32(..)).collect();
                sort_to_completion(&mut elements, group_size);
                for window in elements.windows(2) {
                    assert!(window[0] <= window[1], "out of order at n={n} g={group_size}");
                }
            }
        }
    }

    #[test]
    fn equal_keys_never_swap() {
        let mut elements = vec![7u32; 32];
        let n = elements.len() as u32;
        let mut state = SortState::new(n);
        while !state.is_terminal() {
            let swaps = apply_step(&state, &mut elements);
            assert_eq!(swaps, 0);
            state = state.advanced(n, 8);
        }
    }

    #[test]
    fn payload_rides_with_its_key() {
        let mut rng = fastrand::Rng::with_seed(0xB170_41C5);
        let n = 128u32;
        let entries: Vec<SpatialEntry> = (0..n)
            .map(|i| {
                let key = rng.u32(..1000);
                SpatialEntry {
                    index: i,
                    hash: key.wrapping_mul(0x9E3779B9),
                    key,
                }
            })
            .collect();
        let original = entries.clone();
        let mut sorted = entries;
        sort_to_completion(&mut sorted, 16);
        for window in sorted.windows(2) {
            assert!(window[0].key <= window[1].key);
        }
        // Every record must still be one of the originals, fields intact.
        for entry in &sorted {
            assert_eq!(*entry, original[entry.index as usize]);
        }
    }
}
