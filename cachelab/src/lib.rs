//! # Cachelab
//!
//! Cachelab models a parameterised set-associative cache with LRU
//! replacement and write-back dirty-byte accounting, driven by a replayed
//! memory-access trace
//!
//! It also carries a family of cache-aware matrix transpose strategies that
//! exploit the same cost model: they restructure their access order so the
//! cache the simulator models would report as few misses as possible
//!
//! The simulation is single-threaded and strictly sequential; a run either
//! completes or halts fatally at the first malformed record

/// The cache itself: lines, sets, the access algorithm, and the run statistics
pub mod cache;

/// Cache geometry (s, E, b) with validation and address decomposition
pub mod config;

/// The error taxonomy shared across the crate
pub mod error;

/// Trace file readers, memory mapped where the platform allows
pub mod io;

/// The trace replayer: record parsing and the replay loop
pub mod replay;

/// Cache-aware matrix transpose strategies and their shape dispatch
pub mod transpose;


/// Contains utilities for running tests and benchmarks.
pub mod util;
