//! Deterministic work sharding.
//!
//! An ordered gene list is partitioned into contiguous, non-overlapping
//! slices so independent shard processes can each claim one slice with
//! no coordination beyond agreeing on `(n_items, total_tasks)`.

/// Half-open index range `[start, end)` for one task.
///
/// Slices across all task indices are pairwise disjoint, cover
/// `[0, n_items)` exactly, and differ in size by at most one; the
/// first `n_items % total_tasks` tasks get the longer slices. The
/// mapping is a pure function of its arguments, so rerunning a task
/// reproduces the same slice.
///
/// # Panics
/// Panics when `total_tasks` is zero or `task_index` is out of range;
/// both indicate a misconfigured distributed run and must fail fast.
pub fn shard(n_items: usize, total_tasks: usize, task_index: usize) -> (usize, usize) {
    assert!(total_tasks > 0, "total_tasks must be positive");
    assert!(
        task_index < total_tasks,
        "task_index {task_index} out of range [0, {total_tasks})"
    );

    let base = n_items / total_tasks;
    let remainder = n_items % total_tasks;
    let start = task_index * base + task_index.min(remainder);
    let len = base + usize::from(task_index < remainder);
    (start, start + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(shard(9, 3, 0), (0, 3));
        assert_eq!(shard(9, 3, 1), (3, 6));
        assert_eq!(shard(9, 3, 2), (6, 9));
    }

    #[test]
    fn test_uneven_split() {
        // 10 items over 3 tasks: sizes 4, 3, 3.
        assert_eq!(shard(10, 3, 0), (0, 4));
        assert_eq!(shard(10, 3, 1), (4, 7));
        assert_eq!(shard(10, 3, 2), (7, 10));
    }

    #[test]
    fn test_more_tasks_than_items() {
        assert_eq!(shard(2, 4, 0), (0, 1));
        assert_eq!(shard(2, 4, 1), (1, 2));
        assert_eq!(shard(2, 4, 2), (2, 2));
        assert_eq!(shard(2, 4, 3), (2, 2));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(shard(0, 3, 1), (0, 0));
    }

    #[test]
    fn test_single_task() {
        assert_eq!(shard(7, 1, 0), (0, 7));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_task_index_out_of_range() {
        shard(10, 3, 3);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_zero_tasks() {
        shard(10, 0, 0);
    }
}
