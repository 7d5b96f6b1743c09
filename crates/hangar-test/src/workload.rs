//! Multi-threaded insert workloads.

use std::thread;

use hangar_db::{params, Database, DatabaseResult};

/// Result of a concurrent insert run.
#[derive(Debug, Default)]
pub struct InsertWorkload {
    /// Identities returned to each thread, in that thread's call order.
    pub ids_per_thread: Vec<Vec<i64>>,
}

impl InsertWorkload {
    /// Every identity handed out, sorted.
    pub fn sorted_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.ids_per_thread.iter().flatten().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Runs `per_thread` inserts into `relation` from each of `threads` threads
/// sharing clones of `db`.
pub fn concurrent_inserts(
    db: &Database,
    relation: &str,
    threads: usize,
    per_thread: usize,
) -> DatabaseResult<InsertWorkload> {
    let sql = format!("INSERT INTO {} (worker, seq) VALUES (?, ?)", relation);

    let handles: Vec<_> = (0..threads)
        .map(|worker| {
            let insert = db.prepare(&sql);
            thread::spawn(move || -> DatabaseResult<Vec<i64>> {
                let mut ids = Vec::with_capacity(per_thread);
                for seq in 0..per_thread {
                    let result = insert.run(&params![worker as i64, seq as i64])?;
                    ids.extend(result.last_insert_id);
                }
                Ok(ids)
            })
        })
        .collect();

    let mut workload = InsertWorkload::default();
    for handle in handles {
        match handle.join() {
            Ok(ids) => workload.ids_per_thread.push(ids?),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    Ok(workload)
}
