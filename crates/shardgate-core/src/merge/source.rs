use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor},
    path::{Path, PathBuf},
};

use flate2::read::MultiGzDecoder;
use shardgate_model::ShardKey;

/// Sequential, read-once provider of text lines for one shard.
///
/// `open` is called lazily, when the merger reaches the shard, and at most once.
pub trait LineSource {
    type Reader: BufRead;

    fn open(self) -> io::Result<Self::Reader>;
}

/// One shard: its sort key plus the source of its lines.
#[derive(Debug, Clone)]
pub struct Shard<S> {
    pub key: ShardKey,
    pub source: S,
}

impl<S> Shard<S> {
    pub fn new(key: impl Into<ShardKey>, source: S) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}

/// Local file source.
///
/// Files named `*.gz` or `*.bgz` are decompressed on the fly. Decoding is multi-member aware, so
/// bgzip output (a chain of gzip members) reads through to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_compressed(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("gz") | Some("bgz")
        )
    }
}

impl LineSource for FileSource {
    type Reader = Box<dyn BufRead + Send>;

    fn open(self) -> io::Result<Self::Reader> {
        let file = File::open(&self.path)?;
        if self.is_compressed() {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

/// In-memory source, one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    lines: Vec<String>,
}

impl MemorySource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl LineSource for MemorySource {
    type Reader = Cursor<Vec<u8>>;

    fn open(self) -> io::Result<Self::Reader> {
        let mut buf = Vec::new();
        for line in self.lines {
            buf.extend_from_slice(line.as_bytes());
            buf.push(b'\n');
        }
        Ok(Cursor::new(buf))
    }
}
