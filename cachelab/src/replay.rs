use std::io::BufRead;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use regex::Regex;

use crate::cache::{AccessKind, AccessOutcome, Cache, Statistics};
use crate::error::Error;

lazy_static! {
    // The trace record grammar: `<op> <hex-address>,<decimal-size>`.
    // The hand-rolled parser below is cross-checked against this in debug
    // builds; the regex itself is too slow to run per record
    static ref RECORD_GRAMMAR: Regex = Regex::new(r"^[LS] [0-9a-fA-F]+,[0-9]+$").unwrap();
}

/// One parsed trace record
///
/// The size is parsed and carried for display, but every access is treated
/// as touching exactly one line, so it does not affect cache behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    pub kind: AccessKind,
    pub address: u64,
    pub size: u32,
}

/// Parses a single trace line
///
/// The expected form is `L <hex-address>,<size>` or `S <hex-address>,<size>`.
/// Anything else is an error with a reason; the replayer attaches the line
/// number and makes it fatal
///
/// # Arguments
///
/// * `line`: one line of the trace, without its terminator
///
/// returns: Result<AccessRecord, String>
pub fn parse_record(line: &str) -> Result<AccessRecord, String> {
    let (op, rest) = line
        .split_once(' ')
        .ok_or("expected a space after the operation")?;
    let kind = match op {
        "L" => AccessKind::Load,
        "S" => AccessKind::Store,
        other => return Err(format!("unknown operation {other:?}, expected L or S")),
    };
    let (address, size) = rest
        .split_once(',')
        .ok_or("expected a comma between address and size")?;
    // The numeric parsers tolerate a leading `+`, which the grammar does not
    if !address.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("bad hexadecimal address {address:?}"));
    }
    if !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("bad access size {size:?}"));
    }
    let address = u64::from_str_radix(address, 16)
        .map_err(|e| format!("bad hexadecimal address {address:?}: {e}"))?;
    let size = size
        .parse::<u32>()
        .map_err(|e| format!("bad access size {size:?}: {e}"))?;
    // Any record the parser accepts must also satisfy the grammar
    debug_assert!(RECORD_GRAMMAR.is_match(line));
    Ok(AccessRecord {
        kind,
        address,
        size,
    })
}

/// Replays a stream of trace records against a cache
///
/// The replayer owns the cache for the duration of the run, counts the
/// records it processes, and accumulates wall-clock simulation time.
/// `replay` may be called more than once; the statistics and the timing
/// carry across calls
pub struct Replayer {
    cache: Cache,
    records: u64,
    simulation_time: Duration,
}

impl Replayer {
    pub fn new(cache: Cache) -> Self {
        Self {
            cache,
            records: 0,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Replays every record from the reader, strictly in input order
    ///
    /// The observer is invoked after each access with the record and its
    /// outcome; it is how verbose output stays out of the core. Pass
    /// `|_, _| {}` when no observation is wanted
    ///
    /// A malformed record halts the replay with a fatal error carrying its
    /// 1-based line number; no statistics are reported for such a run
    ///
    /// # Arguments
    ///
    /// * `reader`: the trace transport, anything line-readable
    /// * `observer`: called after each access with (record, outcome)
    ///
    /// returns: Result<Statistics, Error>
    pub fn replay<R: BufRead>(
        &mut self,
        reader: R,
        mut observer: impl FnMut(&AccessRecord, AccessOutcome),
    ) -> Result<Statistics, Error> {
        let start = Instant::now();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let record = parse_record(&line).map_err(|reason| Error::MalformedRecord {
                line: number + 1,
                reason,
            })?;
            let outcome = self.cache.access(record.kind, record.address);
            self.records += 1;
            observer(&record, outcome);
        }
        self.simulation_time += start.elapsed();
        Ok(*self.cache.statistics())
    }

    /// The number of valid records processed so far
    pub fn records_processed(&self) -> u64 {
        self.records
    }

    /// Gets the wall-clock execution time for processing
    pub fn execution_time(&self) -> Duration {
        self.simulation_time
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheGeometry;
    use std::io::Cursor;

    #[test]
    fn parses_loads_and_stores() {
        assert_eq!(
            parse_record("L 7ff0,8").unwrap(),
            AccessRecord {
                kind: AccessKind::Load,
                address: 0x7ff0,
                size: 8,
            }
        );
        assert_eq!(
            parse_record("S 00000000deadBEEF,4").unwrap(),
            AccessRecord {
                kind: AccessKind::Store,
                address: 0xdead_beef,
                size: 4,
            }
        );
    }

    #[test]
    fn rejects_malformed_records() {
        // Instruction fetches are not data accesses
        assert!(parse_record("I 400,2").is_err());
        assert!(parse_record("").is_err());
        assert!(parse_record("L 400 2").is_err());
        assert!(parse_record("L 0x400,2").is_err());
        assert!(parse_record("L 4zz,2").is_err());
        assert!(parse_record("S 400,two").is_err());
        // Signs are numeric-parser extensions, not part of the grammar
        assert!(parse_record("L +1f,4").is_err());
        assert!(parse_record("S 1f,+4").is_err());
        assert!(parse_record("L ,4").is_err());
        assert!(parse_record("L 1f,").is_err());
        assert!(parse_record("load 400,2").is_err());
    }

    #[test]
    fn malformed_record_reports_its_line() {
        let geometry = CacheGeometry::new(1, 1, 1).unwrap();
        let mut replayer = Replayer::new(Cache::new(geometry).unwrap());
        let trace = "L 0,1\nS 2,1\nM 4,1\nL 6,1\n";
        let err = replayer.replay(Cursor::new(trace), |_, _| {}).unwrap_err();
        match err {
            Error::MalformedRecord { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
        // The valid prefix was processed before the fatal stop
        assert_eq!(replayer.records_processed(), 2);
    }

    #[test]
    fn observer_sees_every_record_in_order() {
        let geometry = CacheGeometry::new(0, 1, 2).unwrap();
        let mut replayer = Replayer::new(Cache::new(geometry).unwrap());
        let mut seen = Vec::new();
        let stats = replayer
            .replay(Cursor::new("L 0,1\nL 0,1\nS 10,4\n"), |record, outcome| {
                seen.push((record.address, outcome));
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (0x0, AccessOutcome::Miss),
                (0x0, AccessOutcome::Hit),
                (0x10, AccessOutcome::MissEviction),
            ]
        );
        assert_eq!(stats.hits + stats.misses, replayer.records_processed());
    }

    #[test]
    fn empty_trace_reports_zeroes() {
        let geometry = CacheGeometry::new(4, 2, 4).unwrap();
        let mut replayer = Replayer::new(Cache::new(geometry).unwrap());
        let stats = replayer.replay(Cursor::new(""), |_, _| {}).unwrap();
        assert_eq!(stats, Statistics::default());
    }
}
