use shardgate_model::LineClass;

/// Assigns a [`LineClass`] to a single line.
///
/// Implementations must be a pure function of the line content. Any `Fn(&str) -> LineClass`
/// closure is a classifier.
pub trait Classify {
    fn classify(&self, line: &str) -> LineClass;
}

impl<F> Classify for F
where
    F: Fn(&str) -> LineClass,
{
    #[inline]
    fn classify(&self, line: &str) -> LineClass {
        self(line)
    }
}

/// Prefix-table classifier.
///
/// Markers are checked in insertion order and the first matching prefix wins; lines matching no
/// marker get the fallback class.
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    markers: Vec<(String, LineClass)>,
    fallback: LineClass,
}

/// Prologue lines of a VCF that a merged file must carry exactly once.
const VCF_HEADER_MARKERS: &[&str] = &[
    "##fileformat",
    "##INFO",
    "##FILTER",
    "##FORMAT",
    "##contig",
    "##command",
    "#CHROM",
];

impl MarkerClassifier {
    /// Empty table; every line gets `fallback`.
    pub fn new(fallback: LineClass) -> Self {
        Self {
            markers: Vec::new(),
            fallback,
        }
    }

    /// Append a prefix rule.
    pub fn with_marker(mut self, prefix: impl Into<String>, class: LineClass) -> Self {
        self.markers.push((prefix.into(), class));
        self
    }

    /// VCF preset.
    ///
    /// Format, INFO/FILTER/FORMAT/contig/command metadata and the `#CHROM` column header are
    /// header-control; any other `#` line is pass-through; everything else is data.
    pub fn vcf() -> Self {
        VCF_HEADER_MARKERS
            .iter()
            .fold(Self::new(LineClass::Data), |c, m| {
                c.with_marker(*m, LineClass::HeaderControl)
            })
            .with_marker("#", LineClass::PassThrough)
    }

    pub fn fallback(&self) -> LineClass {
        self.fallback
    }
}

impl Classify for MarkerClassifier {
    fn classify(&self, line: &str) -> LineClass {
        self.markers
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, class)| *class)
            .unwrap_or(self.fallback)
    }
}
