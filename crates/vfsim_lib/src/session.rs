use std::iter;

use crate::clipboard::Clipboard;
use crate::entry::{DirectoryEntry, FileEntry, ensure_directory_name};
use crate::error::{Result, VfsError};
use crate::types::{
    EntryId, MAX_DIRS, Permission, ROOT_ORIGIN, SYSTEM_DIRECTORIES, TRASH_NAME, User, is_system_directory,
};

/// Estado completo del sistema simulado: el bosque de raíces, la papelera,
/// los usuarios y el portapapeles. Un único escritor a la vez; quien lo
/// comparta entre hilos debe envolverlo en un `Mutex`.
#[derive(Debug)]
pub struct Session {
    pub(crate) roots: Vec<DirectoryEntry>,
    pub(crate) trash: DirectoryEntry,
    pub(crate) users: Vec<User>,
    pub(crate) current_user: User,
    pub(crate) clipboard: Option<Clipboard>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Bosque por defecto: las raíces del sistema y un único ADMIN.
    pub fn new() -> Self {
        let roots = SYSTEM_DIRECTORIES
            .iter()
            .filter(|name| **name != TRASH_NAME)
            .map(|name| DirectoryEntry::new(*name))
            .collect();
        let admin = User::default();

        Self {
            roots,
            trash: DirectoryEntry::new(TRASH_NAME),
            users: vec![admin.clone()],
            current_user: admin,
            clipboard: None,
        }
    }

    // --- CONSULTAS ---

    pub fn current_user(&self) -> &User {
        &self.current_user
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn trash(&self) -> &DirectoryEntry {
        &self.trash
    }

    pub fn trash_id(&self) -> EntryId {
        self.trash.id()
    }

    pub fn is_trash(&self, dir: EntryId) -> bool {
        dir == self.trash.id()
    }

    /// Todas las raíces del bosque; la papelera va al final.
    pub fn roots(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.roots.iter().chain(iter::once(&self.trash))
    }

    fn roots_mut(&mut self) -> impl Iterator<Item = &mut DirectoryEntry> {
        self.roots.iter_mut().chain(iter::once(&mut self.trash))
    }

    pub fn root(&self, name: &str) -> Option<&DirectoryEntry> {
        self.roots().find(|r| r.name() == name)
    }

    /// Búsqueda en profundidad por nombre en todo el bosque. Devuelve la
    /// primera coincidencia: si hay nombres repetidos en ramas distintas,
    /// gana la que aparece antes en el recorrido.
    pub fn find_directory(&self, name: &str) -> Option<&DirectoryEntry> {
        self.roots().find_map(|r| r.find_by_name(name))
    }

    pub fn directory(&self, id: EntryId) -> Option<&DirectoryEntry> {
        self.roots().find_map(|r| r.find_by_id(id))
    }

    pub(crate) fn dir_mut(&mut self, id: EntryId) -> Result<&mut DirectoryEntry> {
        self.roots_mut()
            .find_map(|r| r.find_by_id_mut(id))
            .ok_or_else(|| VfsError::not_found(format!("directorio {}", id)))
    }

    pub(crate) fn dir(&self, id: EntryId) -> Result<&DirectoryEntry> {
        self.directory(id).ok_or_else(|| VfsError::not_found(format!("directorio {}", id)))
    }

    pub fn read_file(&self, dir: EntryId, name: &str) -> Result<&FileEntry> {
        self.dir(dir)?.file(name).ok_or_else(|| VfsError::not_found(name))
    }

    pub(crate) fn ensure_not_trash(&self, dir: EntryId) -> Result<()> {
        if self.is_trash(dir) {
            return Err(VfsError::invalid("use el borrado permanente dentro de la papelera"));
        }
        Ok(())
    }

    // --- OPERACIONES DE DIRECTORIO ---

    pub fn create_file(&mut self, dir: EntryId, name: &str, permissions: Permission) -> Result<EntryId> {
        Ok(self.dir_mut(dir)?.create_file(name, permissions)?.id())
    }

    pub fn create_subdirectory(&mut self, dir: EntryId, name: &str) -> Result<EntryId> {
        Ok(self.dir_mut(dir)?.create_subdirectory(name)?.id())
    }

    pub fn rename_file(&mut self, dir: EntryId, old: &str, new: &str) -> Result<()> {
        self.dir_mut(dir)?.rename_file(old, new)
    }

    pub fn rename_subdirectory(&mut self, dir: EntryId, old: &str, new: &str) -> Result<()> {
        self.dir_mut(dir)?.rename_subdirectory(old, new)
    }

    pub fn write_file(&mut self, dir: EntryId, name: &str, content: &str) -> Result<()> {
        let file = self.writable_file(dir, name)?;
        file.set_content(content);
        log::debug!("'{}' reescrito ({} bytes, {})", name, file.size_bytes(), file.allocation_method());
        Ok(())
    }

    pub fn append_file(&mut self, dir: EntryId, name: &str, more: &str) -> Result<()> {
        let file = self.writable_file(dir, name)?;
        file.append_content(more);
        log::debug!("'{}' ampliado ({} bytes, {})", name, file.size_bytes(), file.allocation_method());
        Ok(())
    }

    fn writable_file(&mut self, dir: EntryId, name: &str) -> Result<&mut FileEntry> {
        let file = self.dir_mut(dir)?.file_mut(name).ok_or_else(|| VfsError::not_found(name))?;
        if file.is_read_only() {
            return Err(VfsError::denied(format!("'{}' es de solo lectura", name)));
        }
        Ok(file)
    }

    pub fn set_permissions(&mut self, dir: EntryId, name: &str, permissions: Permission) -> Result<()> {
        let file = self.dir_mut(dir)?.file_mut(name).ok_or_else(|| VfsError::not_found(name))?;
        file.permissions = permissions;
        Ok(())
    }

    /// Mueve un archivo a la papelera. Solo ADMIN; los de solo lectura no se borran.
    pub fn delete_file(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.require_admin()?;
        self.ensure_not_trash(dir)?;

        let in_trash = self.trash.has_file(name);
        let source = self.dir_mut(dir)?;
        let file = source.file(name).ok_or_else(|| VfsError::not_found(name))?;
        if file.is_read_only() {
            return Err(VfsError::denied(format!("'{}' es de solo lectura", name)));
        }
        if in_trash {
            return Err(VfsError::exists(format!("{} (en la papelera)", name)));
        }

        let origin = source.name().to_string();
        let mut file = source.take_file(name)?;
        file.trash_origin = Some(origin.clone());
        self.trash
            .attach_file(file)
            .map_err(|f| VfsError::exists(f.name().to_string()))?;

        log::debug!("Archivo '{}' de '{}' movido a la papelera", name, origin);
        Ok(())
    }

    /// Mueve un subdirectorio (con todo su contenido) a la papelera,
    /// recordando el directorio exacto del que salió.
    pub fn delete_subdirectory(&mut self, dir: EntryId, name: &str) -> Result<()> {
        self.require_admin()?;
        self.ensure_not_trash(dir)?;

        let in_trash = self.trash.has_subdirectory(name);
        let source = self.dir_mut(dir)?;
        if !source.has_subdirectory(name) {
            return Err(VfsError::not_found(name));
        }
        if in_trash {
            return Err(VfsError::exists(format!("{} (en la papelera)", name)));
        }

        let origin = source.name().to_string();
        let parent = source.id();
        let mut moved = source.take_subdirectory(name)?;
        moved.trash_origin = Some(origin.clone());
        moved.trash_parent = Some(parent);
        self.trash
            .attach_subdirectory(moved)
            .map_err(|d| VfsError::exists(d.name().to_string()))?;

        log::debug!("Directorio '{}' de '{}' movido a la papelera", name, origin);
        Ok(())
    }

    // --- RAÍCES DEL BOSQUE ---

    pub fn create_root_directory(&mut self, name: &str) -> Result<EntryId> {
        ensure_directory_name(name)?;
        if self.root(name).is_some() {
            return Err(VfsError::exists(name));
        }
        if self.roots.len() >= MAX_DIRS {
            return Err(VfsError::CapacityExceeded { dir: ROOT_ORIGIN.to_string(), limit: MAX_DIRS });
        }
        let root = DirectoryEntry::new(name);
        let id = root.id();
        self.roots.push(root);
        log::debug!("Raíz '{}' creada", name);
        Ok(id)
    }

    pub fn rename_root_directory(&mut self, old: &str, new: &str) -> Result<()> {
        if is_system_directory(old) {
            return Err(VfsError::denied(format!("'{}' es un directorio del sistema", old)));
        }
        ensure_directory_name(new)?;
        if self.root(new).is_some() {
            return Err(VfsError::exists(new));
        }
        let root = self
            .roots
            .iter_mut()
            .find(|r| r.name() == old)
            .ok_or_else(|| VfsError::not_found(old))?;
        root.set_name(new);
        Ok(())
    }

    /// Las raíces borradas viajan a la papelera sin padre: al restaurarlas
    /// vuelven al nivel superior del bosque.
    pub fn delete_root_directory(&mut self, name: &str) -> Result<()> {
        self.require_admin()?;
        if is_system_directory(name) {
            return Err(VfsError::denied(format!("'{}' es un directorio del sistema", name)));
        }
        let pos = self
            .roots
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| VfsError::not_found(name))?;
        if self.trash.has_subdirectory(name) {
            return Err(VfsError::exists(format!("{} (en la papelera)", name)));
        }

        let mut root = self.roots.remove(pos);
        root.trash_origin = Some(ROOT_ORIGIN.to_string());
        root.trash_parent = None;
        self.trash
            .attach_subdirectory(root)
            .map_err(|d| VfsError::exists(d.name().to_string()))?;

        log::debug!("Raíz '{}' movida a la papelera", name);
        Ok(())
    }
}
