use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use crate::error::Error;

#[cfg(unix)]
use std::io::Cursor;

#[cfg(unix)]
use memmap2::Mmap;

/// A line-oriented reader over a trace file
///
/// An enum rather than a trait object: the replay loop reads from this for
/// every record, and branching on a concrete type lets the compiler inline
/// the buffered reads
pub enum TraceReader {
    #[cfg(unix)]
    Mapped(Cursor<Mmap>),
    Buffered(BufReader<File>),
}

impl Read for TraceReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            #[cfg(unix)]
            TraceReader::Mapped(cursor) => cursor.read(buf),
            TraceReader::Buffered(reader) => reader.read(buf),
        }
    }
}

impl BufRead for TraceReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            #[cfg(unix)]
            TraceReader::Mapped(cursor) => cursor.fill_buf(),
            TraceReader::Buffered(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            #[cfg(unix)]
            TraceReader::Mapped(cursor) => cursor.consume(amt),
            TraceReader::Buffered(reader) => reader.consume(amt),
        }
    }
}

/// Opens the fastest available reader for a trace file
///
/// On unix systems the file is memory mapped and the OS is advised that
/// reads will be sequential, which measurably helps for large traces. Other
/// systems, and files that cannot be mapped (an empty trace, for one), fall
/// back to a generously buffered reader
pub fn get_reader(file: File) -> Result<TraceReader, Error> {
    #[cfg(unix)]
    {
        use memmap2::Advice;
        if file.metadata()?.len() > 0 {
            // SAFETY: the mapping is read-only and lives inside the cursor
            let map = unsafe { Mmap::map(&file)? };
            map.advise(Advice::Sequential)?;
            return Ok(TraceReader::Mapped(Cursor::new(map)));
        }
    }
    // 4096 is the standard block size (or a multiple of it) on most systems
    const BUFFER_SIZE: usize = 64 * 4096;
    Ok(TraceReader::Buffered(BufReader::with_capacity(
        BUFFER_SIZE,
        file,
    )))
}
