//! Cache-aware matrix transpose strategies
//!
//! Every strategy copies an N-row, M-column source into an M-row, N-column
//! destination so that `B[j][i] == A[i][j]`. Matrices are row-major slices:
//! `A[i][j]` is `a[i * m + j]` and `B[j][i]` is `b[j * n + i]`
//!
//! The strategies differ only in access order. None of them allocates; the
//! only working storage allowed is a fixed scratch buffer of
//! [`SCRATCH_SLOTS`] values, so a strategy's cost is entirely the misses its
//! access pattern produces under an LRU cache
//!
//! In debug builds every strategy verifies its output element by element;
//! the check compiles out of optimised builds so it can never contaminate a
//! measured run

/// The number of scalar slots a strategy may use as scratch storage
pub const SCRATCH_SLOTS: usize = 8;

/// Tile width for the blocked strategies. Eight doubles is one 64-byte
/// cache line
const TILE: usize = 8;

/// The available transpose strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Row-major scan of A with a column scatter into B. Baseline; poor
    /// locality for large shapes
    Naive,
    /// 8x8 tiles, reusing each loaded line across the tile before it can be
    /// evicted. Tile edges are clamped, so it is correct for every shape
    Blocked,
    /// Blocked, but full diagonal tiles of a square matrix are staged
    /// through the scratch buffer. On the diagonal the A and B tiles
    /// conflict in the cache, and the staging avoids thrashing within a
    /// tile
    BlockedDiagonal,
    /// Demonstrates the scratch buffer as a 2x2 staging structure. Not
    /// tuned for misses; used for shapes nothing else targets
    Scratch,
}

/// One row of the shape dispatch table
struct ShapeRule {
    m: usize,
    n: usize,
    strategy: Strategy,
}

/// Dispatch is data, not logic: a new tuned shape is a new row here
static SHAPE_RULES: &[ShapeRule] = &[
    ShapeRule {
        m: 32,
        n: 32,
        strategy: Strategy::BlockedDiagonal,
    },
    ShapeRule {
        m: 1024,
        n: 1024,
        strategy: Strategy::Blocked,
    },
];

impl Strategy {
    /// Picks the strategy for an M x N transpose
    ///
    /// Tuned shapes come from the dispatch table; everything else falls
    /// back to Naive for square shapes and Scratch otherwise
    pub fn select(m: usize, n: usize) -> Self {
        for rule in SHAPE_RULES {
            if rule.m == m && rule.n == n {
                return rule.strategy;
            }
        }
        if m == n {
            Strategy::Naive
        } else {
            Strategy::Scratch
        }
    }

    /// Runs the strategy: `a` is N x M row-major and is never written,
    /// `b` is M x N row-major and is fully overwritten
    pub fn run(self, m: usize, n: usize, a: &[f64], b: &mut [f64]) {
        match self {
            Strategy::Naive => naive(m, n, a, b),
            Strategy::Blocked => blocked(m, n, a, b),
            Strategy::BlockedDiagonal => blocked_diagonal(m, n, a, b),
            Strategy::Scratch => scratch(m, n, a, b),
        }
    }
}

/// Transposes with the strategy selected for the shape
pub fn transpose(m: usize, n: usize, a: &[f64], b: &mut [f64]) {
    Strategy::select(m, n).run(m, n, a, b);
}

/// Independent verification that `b` is the transpose of `a`
pub fn is_transpose(m: usize, n: usize, a: &[f64], b: &[f64]) -> bool {
    for i in 0..n {
        for j in 0..m {
            if a[i * m + j] != b[j * n + i] {
                return false;
            }
        }
    }
    true
}

fn check_contract(m: usize, n: usize, a: &[f64], b: &[f64]) {
    assert!(m > 0);
    assert!(n > 0);
    assert_eq!(a.len(), m * n);
    assert_eq!(b.len(), m * n);
}

fn naive(m: usize, n: usize, a: &[f64], b: &mut [f64]) {
    check_contract(m, n, a, b);
    for i in 0..n {
        for j in 0..m {
            b[j * n + i] = a[i * m + j];
        }
    }
    debug_assert!(is_transpose(m, n, a, b));
}

fn blocked(m: usize, n: usize, a: &[f64], b: &mut [f64]) {
    check_contract(m, n, a, b);
    for i in (0..n).step_by(TILE) {
        for j in (0..m).step_by(TILE) {
            for row in i..n.min(i + TILE) {
                for col in j..m.min(j + TILE) {
                    b[col * n + row] = a[row * m + col];
                }
            }
        }
    }
    debug_assert!(is_transpose(m, n, a, b));
}

fn blocked_diagonal(m: usize, n: usize, a: &[f64], b: &mut [f64]) {
    check_contract(m, n, a, b);
    let mut tmp = [0.0f64; SCRATCH_SLOTS];
    for i in (0..n).step_by(TILE) {
        for j in (0..m).step_by(TILE) {
            let full_tile = i + TILE <= n && j + TILE <= m;
            for row in i..n.min(i + TILE) {
                if i == j && full_tile {
                    // Stage the whole source row of the tile before touching
                    // B: on the diagonal the two tiles fight over the same
                    // cache lines
                    tmp.copy_from_slice(&a[row * m + j..row * m + j + TILE]);
                    for (k, value) in tmp.iter().enumerate() {
                        b[(j + k) * n + row] = *value;
                    }
                } else {
                    for col in j..m.min(j + TILE) {
                        b[col * n + row] = a[row * m + col];
                    }
                }
            }
        }
    }
    debug_assert!(is_transpose(m, n, a, b));
}

fn scratch(m: usize, n: usize, a: &[f64], b: &mut [f64]) {
    check_contract(m, n, a, b);
    let mut tmp = [0.0f64; SCRATCH_SLOTS];
    for i in 0..n {
        for j in 0..m {
            // The first four slots form a 2x2 row-major staging array
            let slot = 2 * (i % 2) + (j % 2);
            tmp[slot] = a[i * m + j];
            b[j * n + i] = tmp[slot];
        }
    }
    debug_assert!(is_transpose(m, n, a, b));
}
