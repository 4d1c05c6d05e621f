//! Cover worker pool: persists cover buffers off the coordinating thread.

use std::path::{Path, PathBuf};

use crate::{
    artwork::store::{CoverPaths, write_cover},
    domain::CoverBuffer,
    workers::pool::{JobHandle, WorkerError, WorkerPool},
};

const WORKER_NAME: &str = "cover";

pub struct CoverJob {
    pub buffer: CoverBuffer,
    pub dir: PathBuf,
    pub id: String,
    /// also write the low resolution variant
    pub dual: bool,
}

/// Long-lived pool shared by every scan and enrichment run of an orchestrator.
pub struct CoverWorkerPool {
    pool: WorkerPool<CoverJob, CoverPaths>,
}

impl CoverWorkerPool {
    pub fn spawn(threads: usize) -> Result<Self, WorkerError> {
        let pool = WorkerPool::spawn(WORKER_NAME, threads, |job: CoverJob| {
            write_cover(&job.buffer, &job.dir, &job.id, job.dual)
                .map_err(|e| WorkerError::failed(WORKER_NAME, format!("{}: {e}", job.id)))
        })?;
        Ok(Self { pool })
    }

    pub fn persist(
        &self,
        buffer: CoverBuffer,
        dir: &Path,
        id: &str,
        dual: bool,
    ) -> JobHandle<CoverPaths> {
        self.pool.submit(CoverJob {
            buffer,
            dir: dir.to_path_buf(),
            id: id.to_string(),
            dual,
        })
    }

    /// Persists and waits for the result. A failed write is logged and
    /// reported as `None`: the caller goes on without a cover.
    pub fn persist_now(
        &self,
        buffer: CoverBuffer,
        dir: &Path,
        id: &str,
        dual: bool,
    ) -> Option<CoverPaths> {
        match self.persist(buffer, dir, id, dual).wait() {
            Ok(paths) => Some(paths),
            Err(e) => {
                log::warn!("could not store cover for {id}: {e}");
                None
            }
        }
    }

    pub fn await_completion(&self) {
        self.pool.await_completion();
    }

    pub fn terminate(self) {
        self.pool.await_completion();
        self.pool.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::CoverWorkerPool;
    use crate::{artwork::store::png_bytes, domain::CoverBuffer};

    #[test]
    fn persists_dual_and_single_covers() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = CoverWorkerPool::spawn(2).unwrap();

        let dual = pool
            .persist_now(CoverBuffer(png_bytes(4, 4)), tmp.path(), "track", true)
            .unwrap();
        let single = pool
            .persist_now(CoverBuffer(png_bytes(4, 4)), tmp.path(), "artist", false)
            .unwrap();

        assert!(dual.low.is_some());
        assert!(single.low.is_none());
        assert!(std::path::Path::new(&single.high).exists());
        pool.terminate();
    }

    #[test]
    fn bad_buffer_is_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = CoverWorkerPool::spawn(1).unwrap();

        assert!(
            pool.persist_now(CoverBuffer(vec![1, 2, 3]), tmp.path(), "x", true)
                .is_none()
        );
    }

    #[test]
    fn queued_writes_finish_before_completion() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = CoverWorkerPool::spawn(2).unwrap();

        let handles: Vec<_> = (0..6)
            .map(|i| pool.persist(CoverBuffer(png_bytes(2, 2)), tmp.path(), &i.to_string(), false))
            .collect();
        pool.await_completion();

        for i in 0..6 {
            assert!(tmp.path().join(format!("{i}-high.png")).exists());
        }
        for handle in handles {
            assert!(handle.wait().is_ok());
        }
    }
}
