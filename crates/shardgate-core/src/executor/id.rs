use std::sync::atomic::{AtomicU64, Ordering};

use shardgate_model::JobHandle;

/// Process-wide sequence backing minted handles.
static JOB_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    JOB_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Mint a fresh job handle.
///
/// Format: `{executor}-{job}-{seq:x}`.
/// - `executor`: Executor::name()
/// - `job`: JobSpec.name with every character outside `[A-Za-z0-9_.]` replaced by `-`
/// - `seq`: per-process hex sequence, so handles never collide within one process
pub fn mint_handle(executor: &str, job_name: &str) -> JobHandle {
    let job: String = job_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    JobHandle::new(format!("{executor}-{job}-{seq:x}", seq = next_seq()))
}

#[cfg(test)]
mod tests {
    use super::mint_handle;

    #[test]
    fn handles_are_unique_for_equal_names() {
        let a = mint_handle("local", "coloc");
        let b = mint_handle("local", "coloc");
        assert_ne!(a, b);
    }

    #[test]
    fn job_name_is_sanitized() {
        let h = mint_handle("local", "ExpansionHunter:CPG1 shard 2/20");
        assert!(
            h.as_str().starts_with("local-ExpansionHunter-CPG1-shard-2-20-"),
            "unexpected handle: {h}"
        );
    }
}
