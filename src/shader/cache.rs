//! Refcounted program variant pool.
//!
//! Lookup is a linear scan over the pool; the variant count is bounded by
//! distinct feature combinations in the scene, not by object count, so tens
//! of entries is the expected steady state. A port to hashed lookup would
//! mostly hide a variant explosion rather than fix one.

use log::error;

use crate::errors::{PrismError, Result};
use crate::gl::{GlDriver, ProgramId};
use crate::shader::preprocess;
use crate::shader::program::Program;

#[derive(Default)]
pub struct ProgramCache {
    pool: Vec<Program>,
}

impl ProgramCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or compile the program for `key`. A pool hit bumps the refcount
    /// and returns the shared instance; a miss compiles `vertex`/`fragment`
    /// and reflects its uniform table.
    ///
    /// Compile failure carries numbered source context around the reported
    /// error line; callers log it and skip the draw rather than aborting the
    /// frame.
    pub fn acquire(
        &mut self,
        driver: &mut dyn GlDriver,
        key: u128,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramId> {
        if let Some(program) = self.pool.iter_mut().find(|p| p.key == key) {
            program.used_times += 1;
            return Ok(program.id);
        }

        let id = driver.compile_program(vertex, fragment).map_err(|e| {
            let source = if e.fragment_stage { fragment } else { vertex };
            let context = e
                .line
                .map(|line| preprocess::error_context(source, line))
                .unwrap_or_default();
            PrismError::ProgramCompileFailed {
                log: e.log,
                context,
            }
        })?;
        self.pool
            .push(Program::reflect(driver, id, key, vertex, fragment));
        Ok(id)
    }

    /// Drop one reference. At zero the entry leaves the pool (swap-remove)
    /// and the driver object is deleted; a later identical request compiles
    /// fresh. Releasing an unknown id is a logged no-op.
    pub fn release(&mut self, driver: &mut dyn GlDriver, id: ProgramId) {
        let Some(index) = self.pool.iter().position(|p| p.id == id) else {
            error!("release of a program not in the pool");
            return;
        };
        let program = &mut self.pool[index];
        program.used_times = program.used_times.saturating_sub(1);
        if program.used_times == 0 {
            self.pool.swap_remove(index);
            driver.delete_program(id);
        }
    }

    #[must_use]
    pub fn get(&self, id: ProgramId) -> Option<&Program> {
        self.pool.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ProgramId) -> Option<&mut Program> {
        self.pool.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    #[must_use]
    pub fn used_times(&self, id: ProgramId) -> Option<u32> {
        self.get(id).map(|p| p.used_times)
    }

    /// Delete every pooled program (renderer teardown).
    pub fn clear(&mut self, driver: &mut dyn GlDriver) {
        for program in self.pool.drain(..) {
            driver.delete_program(program.id);
        }
    }
}
