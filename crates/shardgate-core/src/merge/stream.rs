use std::{io::BufRead, iter::FusedIterator, vec};

use shardgate_model::{LineClass, ShardKey};
use tracing::{debug, instrument, trace};

use crate::{
    error::CoreError,
    merge::{Classify, LineSink, LineSource, Shard},
};

/// Counters collected while merging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Shards read to the end.
    pub shards: usize,
    /// Header-control and pass-through lines emitted (first shard only).
    pub header_lines: u64,
    /// Data lines emitted across all shards.
    pub data_lines: u64,
    /// Structural lines dropped from shards after the first.
    pub suppressed_lines: u64,
}

/// Prologue-deduplicating shard merger.
///
/// Holds the line classifier; each call to [`ShardMerger::merge`] takes its own shard set.
#[derive(Debug, Clone)]
pub struct ShardMerger<C> {
    classifier: C,
}

impl<C: Classify> ShardMerger<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Validate and order `shards`, returning a lazy stream of merged lines.
    ///
    /// Fails with [`CoreError::EmptyInput`] for an empty set and with
    /// [`CoreError::DuplicateShardKey`] when two shards share a key. No shard is opened here.
    pub fn merge<S: LineSource>(
        &self,
        shards: Vec<Shard<S>>,
    ) -> Result<MergeStream<'_, S, C>, CoreError> {
        MergeStream::new(order_shards(shards)?, &self.classifier)
    }

    /// Merge `shards` into `sink` and call [`LineSink::finish`] on success.
    ///
    /// On error the sink is left unfinished; discarding it is up to the caller.
    #[instrument(level = "debug", skip_all, fields(shards = shards.len()))]
    pub fn merge_into<S, K>(&self, shards: Vec<Shard<S>>, sink: &mut K) -> Result<MergeReport, CoreError>
    where
        S: LineSource,
        K: LineSink + ?Sized,
    {
        let mut stream = self.merge(shards)?;
        for line in stream.by_ref() {
            sink.write_line(&line?).map_err(CoreError::Sink)?;
        }
        sink.finish().map_err(CoreError::Sink)?;

        let report = stream.report();
        debug!(
            shards = report.shards,
            header_lines = report.header_lines,
            data_lines = report.data_lines,
            suppressed_lines = report.suppressed_lines,
            "merge finished"
        );
        Ok(report)
    }
}

/// Merge `shards` with `classify`; free-function form of [`ShardMerger::merge`].
///
/// The returned stream owns the classifier.
pub fn merge<S, C>(shards: Vec<Shard<S>>, classify: C) -> Result<MergeStream<'static, S, C>, CoreError>
where
    S: LineSource,
    C: Classify + 'static,
{
    MergeStream::new_owned(order_shards(shards)?, classify)
}

/// Sort by key and reject empty or ambiguous shard sets.
fn order_shards<S>(mut shards: Vec<Shard<S>>) -> Result<Vec<Shard<S>>, CoreError> {
    if shards.is_empty() {
        return Err(CoreError::EmptyInput);
    }
    shards.sort_by_key(|s| s.key);
    if let Some(pair) = shards.windows(2).find(|w| w[0].key == w[1].key) {
        return Err(CoreError::DuplicateShardKey(pair[0].key));
    }
    Ok(shards)
}

enum Classifier<'a, C> {
    Borrowed(&'a C),
    Owned(C),
}

impl<C: Classify> Classifier<'_, C> {
    #[inline]
    fn classify(&self, line: &str) -> LineClass {
        match self {
            Classifier::Borrowed(c) => c.classify(line),
            Classifier::Owned(c) => c.classify(line),
        }
    }
}

/// Lazy, finite, non-restartable sequence of merged lines.
///
/// Yields lines without their `\n` terminator. The first error ends the stream. Dropping the
/// stream closes the shard currently open.
pub struct MergeStream<'a, S: LineSource, C> {
    pending: vec::IntoIter<Shard<S>>,
    current: Option<OpenShard<S::Reader>>,
    first_key: ShardKey,
    classifier: Classifier<'a, C>,
    report: MergeReport,
    buf: String,
    done: bool,
}

struct OpenShard<R> {
    key: ShardKey,
    reader: R,
    first: bool,
}

impl<'a, S: LineSource, C: Classify> MergeStream<'a, S, C> {
    fn new(ordered: Vec<Shard<S>>, classifier: &'a C) -> Result<Self, CoreError> {
        Self::build(ordered, Classifier::Borrowed(classifier))
    }

    fn build(ordered: Vec<Shard<S>>, classifier: Classifier<'a, C>) -> Result<Self, CoreError> {
        let first_key = ordered.first().map(|s| s.key).ok_or(CoreError::EmptyInput)?;
        Ok(Self {
            pending: ordered.into_iter(),
            current: None,
            first_key,
            classifier,
            report: MergeReport::default(),
            buf: String::new(),
            done: false,
        })
    }

    /// Key of the shard whose prologue is kept.
    pub fn first_key(&self) -> ShardKey {
        self.first_key
    }

    /// Number of shards read to the end so far.
    pub fn shards_consumed(&self) -> usize {
        self.report.shards
    }

    /// Counters so far; final once the stream returned `None`.
    pub fn report(&self) -> MergeReport {
        self.report
    }

    fn fail(&mut self, err: CoreError) -> Option<Result<String, CoreError>> {
        self.done = true;
        self.current = None;
        Some(Err(err))
    }
}

impl<S: LineSource, C: Classify> MergeStream<'static, S, C> {
    fn new_owned(ordered: Vec<Shard<S>>, classifier: C) -> Result<Self, CoreError> {
        Self::build(ordered, Classifier::Owned(classifier))
    }
}

impl<S: LineSource, C: Classify> Iterator for MergeStream<'_, S, C> {
    type Item = Result<String, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if self.current.is_none() {
                let Some(shard) = self.pending.next() else {
                    self.done = true;
                    return None;
                };
                let first = shard.key == self.first_key;
                trace!(shard = %shard.key, first, "opening shard");
                match shard.source.open() {
                    Ok(reader) => {
                        self.current = Some(OpenShard {
                            key: shard.key,
                            reader,
                            first,
                        });
                    }
                    Err(source) => {
                        return self.fail(CoreError::ShardRead {
                            shard_key: shard.key,
                            source,
                        });
                    }
                }
            }
            let Some(open) = self.current.as_mut() else {
                continue;
            };

            self.buf.clear();
            match open.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    trace!(shard = %open.key, "shard exhausted");
                    self.report.shards += 1;
                    self.current = None;
                }
                Ok(_) => {
                    if self.buf.ends_with('\n') {
                        self.buf.pop();
                    }
                    let class = self.classifier.classify(&self.buf);
                    if class.is_structural() {
                        if !open.first {
                            self.report.suppressed_lines += 1;
                            continue;
                        }
                        self.report.header_lines += 1;
                    } else {
                        self.report.data_lines += 1;
                    }
                    return Some(Ok(self.buf.clone()));
                }
                Err(source) => {
                    let shard_key = open.key;
                    return self.fail(CoreError::ShardRead { shard_key, source });
                }
            }
        }
    }
}

impl<S: LineSource, C: Classify> FusedIterator for MergeStream<'_, S, C> {}
