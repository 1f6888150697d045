use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::StateRecord;
use crate::session::Session;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Error de IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Estado JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

/// Documento JSON en disco con el estado completo de la sesión.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// ESCRIBIR: Registro -> JSON -> archivo temporal -> rename
    pub fn save(&self, record: &StateRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// LEER: `Ok(None)` si todavía no hay archivo de estado
    pub fn load(&self) -> Result<Option<StateRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

impl Session {
    pub fn save(&self, store: &StateStore) -> Result<(), StoreError> {
        store.save(&self.to_record())?;
        log::debug!("Estado guardado en {:?}", store.path());
        Ok(())
    }

    /// Carga la sesión guardada. Un archivo ausente o ilegible no es fatal:
    /// se avisa y se arranca con el bosque por defecto.
    pub fn load_or_default(store: &StateStore) -> Session {
        match store.load() {
            Ok(Some(record)) => {
                log::info!("Estado cargado desde {:?}", store.path());
                Session::from_record(record)
            }
            Ok(None) => {
                log::info!("No existe {:?}; se usa el estado por defecto", store.path());
                Session::new()
            }
            Err(e) => {
                log::warn!("No se pudo cargar {:?}: {}. Se usa el estado por defecto", store.path(), e);
                Session::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Permission;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("file_system_state.json"));

        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        session.create_file(docs, "a.txt", Permission::ReadOnly).unwrap();
        session.save(&store).unwrap();
        assert!(store.exists());

        let loaded = Session::load_or_default(&store);
        let file = loaded.root("Documents").unwrap().file("a.txt").unwrap();
        assert!(file.is_read_only());
        assert_eq!(loaded.to_record(), session.to_record());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("none.json"));
        assert!(store.load().unwrap().is_none());
        assert_eq!(Session::load_or_default(&store).roots().count(), 5);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ no es json").unwrap();
        let store = StateStore::new(&path);

        assert!(matches!(store.load(), Err(StoreError::Json(_))));
        let session = Session::load_or_default(&store);
        assert!(session.root("Documents").is_some());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/deeper/state.json"));
        Session::new().save(&store).unwrap();
        assert!(store.load().unwrap().is_some());
    }
}
