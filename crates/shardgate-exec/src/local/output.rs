use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

use shardgate_model::JobHandle;

/// How child output is forwarded to the log.
#[derive(Debug, Clone, Copy)]
pub struct OutputLogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for OutputLogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: false,
            stderr_warn: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

/// Forward every line of `reader` as a log event, draining it to EOF.
///
/// Bytes that are not UTF-8 are replaced, not treated as an error, so the child never sees a
/// closed pipe while it is still writing.
pub(crate) async fn forward_lines<R>(reader: R, stream: Stream, job: JobHandle, cfg: OutputLogConfig)
where
    R: AsyncRead + Unpin,
{
    let res = read_lines(reader, cfg.max_line_length, |line| {
        let text = String::from_utf8_lossy(line);
        emit(stream, &job, truncate(&text, cfg.max_line_length), cfg);
    })
    .await;
    if let Err(e) = res {
        debug!(job = %job, stream = ?stream, error = %e, "stopped reading child output");
    }
}

/// Split `reader` on `\n` and hand each line to `on_line` without its terminator.
///
/// At most `max` bytes of a line are kept; the rest of it is read and discarded. A final line
/// without a terminator is still delivered.
async fn read_lines<R, F>(reader: R, max: usize, mut on_line: F) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&[u8]),
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            if !line.is_empty() {
                on_line(strip_cr(&line));
            }
            return Ok(());
        }

        let (taken, complete) = match chunk.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (chunk.len(), false),
        };
        let body = if complete { &chunk[..taken - 1] } else { chunk };
        let room = max.saturating_sub(line.len());
        line.extend_from_slice(&body[..body.len().min(room)]);
        reader.consume(taken);

        if complete {
            on_line(strip_cr(&line));
            line.clear();
        }
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn emit(stream: Stream, job: &JobHandle, line: &str, cfg: OutputLogConfig) {
    match stream {
        Stream::Stdout if cfg.stdout_info => info!(job = %job, "{line}"),
        Stream::Stdout => debug!(job = %job, "{line}"),
        Stream::Stderr if cfg.stderr_warn => warn!(job = %job, "{line}"),
        Stream::Stderr => debug!(job = %job, stream = "stderr", "{line}"),
    }
}

/// Longest prefix of `line` no longer than `max` bytes ending on a char boundary.
fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}
