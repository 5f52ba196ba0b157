//! Line-delimited JSON dump reading: plain or zstd-compressed, one submission
//! record per line, yielded lazily.

use crate::error::DumpError;
use crate::paths::DumpFile;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

/// The fields the scraper needs from a dump line. Extra fields are ignored by serde.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct DumpRecord {
    pub id: Option<String>,
    pub subreddit_id: Option<String>,
    pub score: Option<i64>,
    pub permalink: Option<String>,
}

#[inline]
pub fn parse_record(line: &str) -> Result<DumpRecord, serde_json::Error> {
    serde_json::from_str(line)
}

/// A `Read` wrapper that counts on-disk bytes consumed (compressed bytes for `.zst`).
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Lazy record stream over one dump file.
/// Blank lines are skipped; the first malformed line ends the stream with an error.
pub struct DumpReader {
    path: PathBuf,
    rdr: Box<dyn BufRead>,
    counter: Arc<AtomicU64>,
    line_no: u64,
    buf: String,
    done: bool,
}

impl DumpReader {
    pub fn open(file: &DumpFile, buf_bytes: usize) -> Result<Self, DumpError> {
        Self::open_path(&file.path, file.is_zstd(), buf_bytes)
    }

    pub fn open_path(path: &Path, zstd: bool, buf_bytes: usize) -> Result<Self, DumpError> {
        let open_err = |source: io::Error| DumpError::Open { path: path.to_path_buf(), source };
        let f = File::open(path).map_err(open_err)?;
        let counter = Arc::new(AtomicU64::new(0));
        let cnt = CountingReader { inner: f, counter: counter.clone() };
        let cap = buf_bytes.max(8 * 1024);

        let rdr: Box<dyn BufRead> = if zstd {
            let mut decoder = Decoder::new(cnt).map_err(open_err)?;
            // Monthly dumps are compressed with long windows.
            decoder.window_log_max(31).map_err(open_err)?;
            Box::new(BufReader::with_capacity(cap, decoder))
        } else {
            Box::new(BufReader::with_capacity(cap, cnt))
        };

        Ok(Self {
            path: path.to_path_buf(),
            rdr,
            counter,
            line_no: 0,
            buf: String::with_capacity(16 * 1024),
            done: false,
        })
    }

    /// On-disk bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// 1-based number of the last line read.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }
}

impl Iterator for DumpReader {
    type Item = Result<DumpRecord, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.rdr.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    self.done = true;
                    return Some(Err(DumpError::Read { path: self.path.clone(), source }));
                }
            }
            self.line_no += 1;
            let line = self.buf.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_record(line).map_err(|source| {
                self.done = true;
                DumpError::Parse { path: self.path.clone(), line: self.line_no, source }
            }));
        }
    }
}
