use crate::error::{Result, VfsError};
use crate::session::Session;
use crate::types::EntryId;

/// Resultado de una operación sobre una selección mixta: cada nombre se
/// procesa por separado y un fallo no detiene al resto.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, VfsError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, name: &str, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.succeeded.push(name.to_string()),
            Err(e) => self.failed.push((name.to_string(), e)),
        }
    }
}

#[derive(Clone, Copy)]
enum Kind {
    File,
    Directory,
}

impl Session {
    /// Clasifica cada nombre como archivo o directorio (primero archivo).
    fn classify(&self, dir: EntryId, names: &[&str]) -> Result<Vec<(String, Option<Kind>)>> {
        let dir = self.dir(dir)?;
        Ok(names
            .iter()
            .map(|name| {
                let kind = if dir.has_file(name) {
                    Some(Kind::File)
                } else if dir.has_subdirectory(name) {
                    Some(Kind::Directory)
                } else {
                    None
                };
                (name.to_string(), kind)
            })
            .collect())
    }

    fn run_batch(
        &mut self,
        dir: EntryId,
        names: &[&str],
        mut on_file: impl FnMut(&mut Session, &str) -> Result<()>,
        mut on_dir: impl FnMut(&mut Session, &str) -> Result<()>,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for (name, kind) in self.classify(dir, names)? {
            let outcome = match kind {
                Some(Kind::File) => on_file(self, &name),
                Some(Kind::Directory) => on_dir(self, &name),
                None => Err(VfsError::not_found(name.as_str())),
            };
            report.record(&name, outcome);
        }
        Ok(report)
    }

    pub fn delete_items(&mut self, dir: EntryId, names: &[&str]) -> Result<BatchReport> {
        self.run_batch(
            dir,
            names,
            |s, name| s.delete_file(dir, name),
            |s, name| s.delete_subdirectory(dir, name),
        )
    }

    /// Restaura primero los archivos y después los directorios.
    pub fn restore_items(&mut self, dir: EntryId, names: &[&str]) -> Result<BatchReport> {
        let (files, dirs): (Vec<&str>, Vec<&str>) = {
            let trash = self.dir(dir)?;
            let files = names.iter().copied().filter(|n| trash.has_file(n)).collect();
            let dirs = names.iter().copied().filter(|n| !trash.has_file(n)).collect();
            (files, dirs)
        };
        let mut report = self.run_batch(dir, &files, |s, name| s.restore_file(dir, name), |_, _| Ok(()))?;
        let second = self.run_batch(dir, &dirs, |_, _| Ok(()), |s, name| s.restore_directory(dir, name))?;
        report.succeeded.extend(second.succeeded);
        report.failed.extend(second.failed);
        Ok(report)
    }

    pub fn delete_items_permanently(&mut self, dir: EntryId, names: &[&str]) -> Result<BatchReport> {
        self.run_batch(
            dir,
            names,
            |s, name| s.delete_file_permanently(dir, name),
            |s, name| s.delete_directory_permanently(dir, name),
        )
    }
}
