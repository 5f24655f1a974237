use std::{fs, path::Path};

use shardgate_model::ShardKeyRule;
use tracing::{debug, trace};

use crate::{
    error::CoreError,
    merge::{FileSource, Shard},
};

/// List the shard files in `dir` whose names end with `suffix`.
///
/// Each file's key comes from `rule`; a matching file whose key cannot be derived is an error
/// rather than silently skipped, since a missing shard would corrupt the merged output.
/// Symlinks are followed, so a dangling link to a shard is an error too. Subdirectories are ignored. The result is sorted by key, but duplicate keys are left for the
/// merger to reject.
pub fn discover_shards(
    dir: &Path,
    suffix: &str,
    rule: &ShardKeyRule,
) -> Result<Vec<Shard<FileSource>>, CoreError> {
    let discovery = |source| CoreError::Discovery {
        dir: dir.to_path_buf(),
        source,
    };

    let mut shards = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery)? {
        let entry = entry.map_err(discovery)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            trace!(name = ?name, "skipping non UTF-8 file name");
            continue;
        };
        if !name.ends_with(suffix) {
            continue;
        }
        if !fs::metadata(entry.path()).map_err(discovery)?.is_file() {
            continue;
        }
        let key = rule
            .derive(name)
            .ok_or_else(|| CoreError::InvalidShardName(name.to_string()))?;
        trace!(file = name, key = %key, "shard discovered");
        shards.push(Shard::new(key, FileSource::new(entry.path())));
    }

    shards.sort_by_key(|s| s.key);
    debug!(dir = %dir.display(), count = shards.len(), rule = %rule, "shard discovery finished");
    Ok(shards)
}
