use crate::error::{Result, VfsError};
use crate::session::Session;
use crate::types::{EntryId, ROOT_ORIGIN};

impl Session {
    fn ensure_trash(&self, dir: EntryId) -> Result<()> {
        if !self.is_trash(dir) {
            return Err(VfsError::invalid("solo se puede operar así dentro de la papelera"));
        }
        Ok(())
    }

    /// Devuelve un archivo al directorio cuyo nombre quedó guardado al borrarlo.
    pub fn restore_file(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.ensure_trash(dir)?;

        let file = self.trash.file(name).ok_or_else(|| VfsError::not_found(name))?;
        let origin = file
            .trash_origin()
            .map(str::to_string)
            .ok_or_else(|| VfsError::MissingOriginInfo(name.to_string()))?;
        let target = self
            .find_directory(&origin)
            .ok_or_else(|| VfsError::not_found(origin.clone()))?;
        if target.has_file(name) {
            return Err(VfsError::exists(format!("{} en '{}'", name, origin)));
        }
        let target_id = target.id();

        let mut file = self.trash.take_file(name)?;
        file.trash_origin = None;
        self.dir_mut(target_id)?
            .attach_file(file)
            .map_err(|f| VfsError::exists(f.name().to_string()))?;

        log::debug!("Archivo '{}' restaurado en '{}'", name, origin);
        Ok(())
    }

    /// Restaura un directorio usando el ID del padre guardado, no su nombre.
    /// Las raíces borradas vuelven al nivel superior del bosque.
    pub fn restore_directory(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.ensure_trash(dir)?;

        let entry = self.trash.subdirectory(name).ok_or_else(|| VfsError::not_found(name))?;
        let from_root = entry.trash_origin() == Some(ROOT_ORIGIN);
        match (entry.trash_parent(), from_root) {
            (Some(parent), _) => {
                if entry.contains_directory(parent) {
                    return Err(VfsError::MissingOriginInfo(name.to_string()));
                }
                let target = self.dir(parent)?;
                if target.has_subdirectory(name) {
                    return Err(VfsError::exists(format!("{} en '{}'", name, target.name())));
                }
                let mut restored = self.trash.take_subdirectory(name)?;
                restored.clear_trash_marks();
                self.dir_mut(parent)?
                    .attach_subdirectory(restored)
                    .map_err(|d| VfsError::exists(d.name().to_string()))?;
            }
            (None, true) => {
                if self.root(name).is_some() {
                    return Err(VfsError::exists(format!("{} en el nivel raíz", name)));
                }
                let mut restored = self.trash.take_subdirectory(name)?;
                restored.clear_trash_marks();
                self.roots.push(restored);
            }
            (None, false) => return Err(VfsError::MissingOriginInfo(name.to_string())),
        }

        log::debug!("Directorio '{}' restaurado", name);
        Ok(())
    }

    pub fn delete_file_permanently(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.ensure_trash(dir)?;
        self.trash.take_file(name)?;
        log::debug!("Archivo '{}' eliminado definitivamente", name);
        Ok(())
    }

    /// Elimina el directorio y todo su subárbol en un solo paso.
    pub fn delete_directory_permanently(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.ensure_trash(dir)?;
        self.trash.take_subdirectory(name)?;
        log::debug!("Directorio '{}' eliminado definitivamente", name);
        Ok(())
    }

    /// Borrado definitivo sin saber el tipo: primero archivo, luego directorio.
    pub fn delete_permanently(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.ensure_trash(dir)?;
        if self.trash.has_file(name) {
            self.delete_file_permanently(dir, name)
        } else {
            self.delete_directory_permanently(dir, name)
        }
    }

    /// Vacía la papelera. Devuelve cuántas entradas se eliminaron; nunca falla.
    pub fn empty_trash(&mut self) -> usize {
        let removed = self.trash.clear();
        if removed > 0 {
            log::info!("Papelera vaciada ({} entradas)", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AllocationMethod, Permission, Role, User};

    #[test]
    fn test_reports_scenario() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();

        let reports = session.create_subdirectory(docs, "Reports").unwrap();
        session.create_file(reports, "a.txt", Permission::ReadWrite).unwrap();
        session.write_file(reports, "a.txt", &"r".repeat(3000)).unwrap();
        let file = session.read_file(reports, "a.txt").unwrap();
        assert_eq!(file.allocation_method(), AllocationMethod::Linked);
        assert_eq!(file.block_count(), 6);

        session.delete_file(reports, "a.txt").unwrap();
        assert_eq!(session.trash().file("a.txt").unwrap().trash_origin(), Some("Reports"));

        session.current_user = User::new("guest", Role::User);
        assert!(matches!(session.delete_subdirectory(docs, "Reports"), Err(VfsError::PermissionDenied(_))));

        session.current_user = User::default();
        session.restore_file(trash, "a.txt").unwrap();
        let restored = session.read_file(reports, "a.txt").unwrap();
        assert_eq!(restored.allocation_method(), AllocationMethod::Linked);
        assert_eq!(restored.content(), "r".repeat(3000));
        assert_eq!(restored.trash_origin(), None);
        assert!(session.trash().files().is_empty());
    }

    #[test]
    fn test_restore_requires_trash_context() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        assert!(matches!(session.restore_file(docs, "a"), Err(VfsError::InvalidContext(_))));
        assert!(matches!(session.restore_directory(docs, "a"), Err(VfsError::InvalidContext(_))));
        assert!(matches!(session.delete_file_permanently(docs, "a"), Err(VfsError::InvalidContext(_))));
    }

    #[test]
    fn test_restore_file_conflict_and_missing_origin() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();

        session.create_file(docs, "a.txt", Permission::ReadWrite).unwrap();
        session.delete_file(docs, "a.txt").unwrap();
        session.create_file(docs, "a.txt", Permission::ReadWrite).unwrap();
        assert!(matches!(session.restore_file(trash, "a.txt"), Err(VfsError::AlreadyExists(_))));
        assert_eq!(session.trash().file("a.txt").unwrap().trash_origin(), Some("Documents"));

        // Origen que ya no existe en el bosque
        session.trash.file_mut("a.txt").unwrap().trash_origin = Some("Gone".into());
        assert!(matches!(session.restore_file(trash, "a.txt"), Err(VfsError::NotFound(_))));

        session.trash.file_mut("a.txt").unwrap().trash_origin = None;
        assert!(matches!(session.restore_file(trash, "a.txt"), Err(VfsError::MissingOriginInfo(_))));
    }

    #[test]
    fn test_restore_directory_uses_exact_parent() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let media = session.root("Media").unwrap().id();
        let trash = session.trash_id();

        // Dos directorios "Shared": el nombre solo no basta para restaurar
        session.create_subdirectory(docs, "Shared").unwrap();
        let media_shared = session.create_subdirectory(media, "Shared").unwrap();
        session.create_subdirectory(media_shared, "Inner").unwrap();

        session.delete_subdirectory(media_shared, "Inner").unwrap();
        session.restore_directory(trash, "Inner").unwrap();

        let inner = session.directory(media_shared).unwrap().subdirectory("Inner").unwrap();
        assert_eq!(inner.trash_origin(), None);
        assert_eq!(inner.trash_parent(), None);
    }

    #[test]
    fn test_restore_directory_conflict() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();

        session.create_subdirectory(docs, "Reports").unwrap();
        session.delete_subdirectory(docs, "Reports").unwrap();
        session.create_subdirectory(docs, "Reports").unwrap();
        assert!(matches!(session.restore_directory(trash, "Reports"), Err(VfsError::AlreadyExists(_))));
        assert!(session.trash().has_subdirectory("Reports"));
    }

    #[test]
    fn test_restore_root_directory() {
        let mut session = Session::new();
        let trash = session.trash_id();
        session.create_root_directory("Games").unwrap();
        session.delete_root_directory("Games").unwrap();

        session.restore_directory(trash, "Games").unwrap();
        assert!(session.root("Games").is_some());
        assert!(!session.trash().has_subdirectory("Games"));
        // La papelera sigue al final del bosque
        assert_eq!(session.roots().last().unwrap().name(), "Trash");
    }

    #[test]
    fn test_restore_directory_without_origin() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();
        session.create_subdirectory(docs, "Old").unwrap();
        session.delete_subdirectory(docs, "Old").unwrap();

        let old = session.trash.subdirectory("Old").unwrap().id();
        session.trash.find_by_id_mut(old).unwrap().clear_trash_marks();
        assert!(matches!(session.restore_directory(trash, "Old"), Err(VfsError::MissingOriginInfo(_))));
    }

    #[test]
    fn test_permanent_delete_and_empty_trash() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();

        let tree = session.create_subdirectory(docs, "Tree").unwrap();
        session.create_subdirectory(tree, "Leaf").unwrap();
        session.create_file(docs, "a.txt", Permission::ReadWrite).unwrap();
        session.create_file(docs, "b.txt", Permission::ReadWrite).unwrap();
        session.delete_subdirectory(docs, "Tree").unwrap();
        session.delete_file(docs, "a.txt").unwrap();
        session.delete_file(docs, "b.txt").unwrap();

        session.delete_directory_permanently(trash, "Tree").unwrap();
        assert!(session.directory(tree).is_none());
        assert!(matches!(session.delete_directory_permanently(trash, "Tree"), Err(VfsError::NotFound(_))));

        session.delete_file_permanently(trash, "a.txt").unwrap();
        assert_eq!(session.empty_trash(), 1);
        assert_eq!(session.empty_trash(), 0);
        assert!(session.trash().entries().is_empty());
    }

    #[test]
    fn test_restore_and_purge_are_not_role_gated() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();
        session.create_file(docs, "a.txt", Permission::ReadWrite).unwrap();
        session.create_file(docs, "b.txt", Permission::ReadWrite).unwrap();
        session.delete_file(docs, "a.txt").unwrap();
        session.delete_file(docs, "b.txt").unwrap();

        session.add_user("guest", Role::User).unwrap();
        session.restore_file(trash, "a.txt").unwrap();
        session.delete_file_permanently(trash, "b.txt").unwrap();
    }

    #[test]
    fn test_delete_permanently_either_kind() {
        let mut session = Session::new();
        let docs = session.root("Documents").unwrap().id();
        let trash = session.trash_id();
        session.create_file(docs, "x", Permission::ReadWrite).unwrap();
        session.create_subdirectory(docs, "y").unwrap();
        session.delete_file(docs, "x").unwrap();
        session.delete_subdirectory(docs, "y").unwrap();

        session.delete_permanently(trash, "x").unwrap();
        session.delete_permanently(trash, "y").unwrap();
        assert!(matches!(session.delete_permanently(trash, "x"), Err(VfsError::NotFound(_))));
        assert!(matches!(session.delete_permanently(docs, "x"), Err(VfsError::InvalidContext(_))));
        assert!(session.trash().entries().is_empty());
    }
}
