use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use flate2::{Compression, write::GzEncoder};
use tracing::{debug, warn};

/// Sequential, append-only consumer of merged lines.
pub trait LineSink {
    /// Append one line. `line` carries no terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Called once after the last line of a successful merge.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_owned());
        Ok(())
    }
}

/// Adapts any [`Write`] into a sink; every line is terminated with `\n`.
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// File sink that only appears at its final path once the merge finished.
///
/// Lines go to `<path>.part`; [`LineSink::finish`] flushes and renames it into place. If the sink
/// is dropped unfinished the partial file is removed, so a failed merge never leaves an output that
/// looks complete. Targets ending in `.gz` or `.bgz` are gzip-compressed.
#[derive(Debug)]
pub struct PartFileSink {
    target: PathBuf,
    part: PathBuf,
    writer: Option<PartWriter>,
}

#[derive(Debug)]
enum PartWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl PartWriter {
    fn as_write(&mut self) -> &mut dyn Write {
        match self {
            PartWriter::Plain(w) => w,
            PartWriter::Gzip(w) => w,
        }
    }

    /// Flush every layer and hand back the underlying file.
    fn into_file(self) -> io::Result<File> {
        let buffered = match self {
            PartWriter::Plain(w) => w,
            PartWriter::Gzip(w) => w.finish()?,
        };
        buffered.into_inner().map_err(|e| e.into_error())
    }
}

impl PartFileSink {
    pub fn create(target: impl Into<PathBuf>) -> io::Result<Self> {
        let target = target.into();
        let part = part_path(&target);
        let file = BufWriter::new(File::create(&part)?);
        let writer = if is_gzip_path(&target) {
            PartWriter::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            PartWriter::Plain(file)
        };
        debug!(part = %part.display(), "opened partial output");
        Ok(Self {
            target,
            part,
            writer: Some(writer),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    fn writer(&mut self) -> io::Result<&mut dyn Write> {
        self.writer
            .as_mut()
            .map(PartWriter::as_write)
            .ok_or_else(|| io::Error::other("sink already finished"))
    }
}

fn is_gzip_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("gz" | "bgz")
    )
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

impl LineSink for PartFileSink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let w = self.writer()?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        let w = self
            .writer
            .take()
            .ok_or_else(|| io::Error::other("sink already finished"))?;
        let finished = w.into_file().and_then(|file| file.sync_all());
        if let Err(e) = finished {
            let _ = fs::remove_file(&self.part);
            return Err(e);
        }
        fs::rename(&self.part, &self.target).inspect_err(|_| {
            let _ = fs::remove_file(&self.part);
        })
    }
}

impl Drop for PartFileSink {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            if let Err(e) = fs::remove_file(&self.part) {
                warn!(part = %self.part.display(), error = %e, "failed to remove partial output");
            }
        }
    }
}
