use std::fmt::Write;
use std::io::Cursor;

use crate::cache::{Cache, Statistics};
use crate::config::CacheGeometry;
use crate::error::Error;
use crate::replay::Replayer;

/// Fills an N x M row-major matrix with distinct values, so a misplaced
/// element is always detectable
pub fn numbered_matrix(m: usize, n: usize) -> Vec<f64> {
    (0..m * n).map(|v| v as f64).collect()
}

/// Renders a trace of `count` accesses starting at `start`, each `stride`
/// bytes after the last
///
/// # Arguments
///
/// * `op`: 'L' or 'S', written as-is
/// * `start`: address of the first access
/// * `stride`: distance between consecutive accesses
/// * `count`: number of records
/// * `size`: the access size written on every record
///
/// returns: String
pub fn stride_trace(op: char, start: u64, stride: u64, count: usize, size: u32) -> String {
    let mut out = String::new();
    for k in 0..count {
        let address = start + stride * k as u64;
        writeln!(out, "{op} {address:x},{size}").unwrap();
    }
    out
}

/// Replays a trace held in memory against a fresh cache for a geometry
pub fn replay_str(geometry: CacheGeometry, trace: &str) -> Result<Statistics, Error> {
    let mut replayer = Replayer::new(Cache::new(geometry)?);
    replayer.replay(Cursor::new(trace), |_, _| {})
}
