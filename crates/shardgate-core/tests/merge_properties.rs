//! Merge behaviour over file-backed and instrumented shard sources.

use std::{
    fs,
    io::{self, BufRead, Cursor, Read},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use shardgate_core::{
    CoreError, LineSource, MarkerClassifier, MemorySource, PartFileSink, Shard, ShardMerger,
    WriteSink, discover_shards,
};
use shardgate_model::{ShardKey, ShardKeyRule};

fn vcf_shard(sample: &str, contig: &str, records: &[&str]) -> Vec<String> {
    let mut lines = vec![
        "##fileformat=VCFv4.2".to_string(),
        format!("##contig=<ID={contig}>"),
        format!("##command=ExpansionHunter --sample {sample}"),
        "#CHROM\tPOS\tID\tREF\tALT".to_string(),
    ];
    lines.extend(records.iter().map(|r| r.to_string()));
    lines
}

fn merged_bytes(shards: Vec<Shard<MemorySource>>) -> Vec<u8> {
    let merger = ShardMerger::new(MarkerClassifier::vcf());
    let mut sink = WriteSink::new(Vec::new());
    merger.merge_into(shards, &mut sink).unwrap();
    sink.into_inner()
}

#[test]
fn header_prefix_comes_from_min_key_shard_regardless_of_submission_order() {
    let a = vcf_shard("A", "chr1", &["chr1\t10\t.\tA\t<STR2>"]);
    let b = vcf_shard("B", "chr2", &["chr2\t20\t.\tC\t<STR4>"]);
    let c = vcf_shard("C", "chr3", &["chr3\t30\t.\tG\t<STR5>"]);

    let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 2, 0]];
    let sources = [a.clone(), b, c];
    let keys = [4u64, 9, 17];

    let mut outputs = Vec::new();
    for order in orders {
        let shards = order
            .iter()
            .map(|&i| Shard::new(keys[i], MemorySource::new(sources[i].clone())))
            .collect();
        outputs.push(merged_bytes(shards));
    }

    let text = String::from_utf8(outputs[0].clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(&lines[..4], &a[..4].iter().map(String::as_str).collect::<Vec<_>>()[..]);
    assert_eq!(
        &lines[4..],
        &["chr1\t10\t.\tA\t<STR2>", "chr2\t20\t.\tC\t<STR4>", "chr3\t30\t.\tG\t<STR5>"]
    );
    assert!(outputs.iter().all(|o| o == &outputs[0]), "output depends on submission order");
}

#[test]
fn rerunning_a_file_merge_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    for (i, rec) in [(1, "chr1\t1"), (2, "chr1\t2"), (10, "chr1\t10")] {
        let body = vcf_shard("S", "chr1", &[rec]).join("\n") + "\n";
        fs::write(dir.path().join(format!("S_eh_shard{i}.vcf")), body).unwrap();
    }
    let rule = ShardKeyRule::AfterMarker("eh_shard".into());
    let merger = ShardMerger::new(MarkerClassifier::vcf());

    let out_dir = tempfile::tempdir().unwrap();
    let mut runs = Vec::new();
    for run in 0..2 {
        let out = out_dir.path().join(format!("combined{run}.vcf"));
        let shards = discover_shards(dir.path(), ".vcf", &rule).unwrap();
        let mut sink = PartFileSink::create(&out).unwrap();
        let report = merger.merge_into(shards, &mut sink).unwrap();
        assert_eq!(report.shards, 3);
        runs.push(fs::read(&out).unwrap());
    }

    assert_eq!(runs[0], runs[1]);
    let text = String::from_utf8(runs[0].clone()).unwrap();
    assert!(text.ends_with("chr1\t1\nchr1\t2\nchr1\t10\n"), "unexpected order: {text}");
}

/// Source that tracks how many shard readers are alive at once.
struct CountingSource {
    lines: usize,
    open: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct CountingReader {
    inner: Cursor<Vec<u8>>,
    open: Arc<AtomicUsize>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl BufRead for CountingReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

impl Drop for CountingReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LineSource for CountingSource {
    type Reader = CountingReader;

    fn open(self) -> io::Result<Self::Reader> {
        let now = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let mut body = b"#header\n".to_vec();
        for i in 0..self.lines {
            body.extend_from_slice(format!("row{i}\n").as_bytes());
        }
        Ok(CountingReader {
            inner: Cursor::new(body),
            open: self.open,
        })
    }
}

#[test]
fn at_most_one_shard_is_open_at_a_time() {
    let open = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let shards: Vec<_> = (0..50u64)
        .map(|k| {
            Shard::new(
                k,
                CountingSource {
                    lines: 20,
                    open: Arc::clone(&open),
                    peak: Arc::clone(&peak),
                },
            )
        })
        .collect();

    let merger = ShardMerger::new(MarkerClassifier::vcf());
    let mut out = Vec::<String>::new();
    let report = merger.merge_into(shards, &mut out).unwrap();

    assert_eq!(report.shards, 50);
    assert_eq!(out.len(), 1 + 50 * 20);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

#[test]
fn dropping_the_stream_closes_the_open_shard() {
    let open = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let shards = vec![Shard::new(
        1,
        CountingSource {
            lines: 5,
            open: Arc::clone(&open),
            peak: Arc::clone(&peak),
        },
    )];

    let merger = ShardMerger::new(MarkerClassifier::vcf());
    let mut stream = merger.merge(shards).unwrap();
    assert!(stream.next().is_some());
    assert_eq!(open.load(Ordering::SeqCst), 1);

    drop(stream);
    assert_eq!(open.load(Ordering::SeqCst), 0);
}

/// Source whose reads fail after the header.
struct BrokenSource;

impl LineSource for BrokenSource {
    type Reader = io::BufReader<BrokenReader>;

    fn open(self) -> io::Result<Self::Reader> {
        Ok(io::BufReader::new(BrokenReader { served: false }))
    }
}

struct BrokenReader {
    served: bool,
}

impl Read for BrokenReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream reset"));
        }
        self.served = true;
        let line = b"#header\n";
        buf[..line.len()].copy_from_slice(line);
        Ok(line.len())
    }
}

#[test]
fn read_failure_names_the_shard_and_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("combined.vcf");

    let merger = ShardMerger::new(MarkerClassifier::vcf());
    let mut sink = PartFileSink::create(&out).unwrap();
    let err = merger
        .merge_into(vec![Shard::new(6, BrokenSource)], &mut sink)
        .unwrap_err();
    drop(sink);

    match err {
        CoreError::ShardRead { shard_key, source } => {
            assert_eq!(shard_key, ShardKey::new(6));
            assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("expected ShardRead, got {other:?}"),
    }
    assert!(!out.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn missing_shard_file_is_a_read_error_for_that_key() {
    let dir = tempfile::tempdir().unwrap();
    let present = dir.path().join("x_eh_shard1.vcf");
    fs::write(&present, "#CHROM\nr1\n").unwrap();

    let shards = vec![
        Shard::new(1, shardgate_core::FileSource::new(&present)),
        Shard::new(2, shardgate_core::FileSource::new(dir.path().join("x_eh_shard2.vcf"))),
    ];
    let merger = ShardMerger::new(MarkerClassifier::vcf());
    let results: Vec<_> = merger.merge(shards).unwrap().collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap(), "#CHROM");
    assert_eq!(results[1].as_ref().unwrap(), "r1");
    assert!(matches!(
        results[2],
        Err(CoreError::ShardRead { shard_key, .. }) if shard_key == ShardKey::new(2)
    ));
}
