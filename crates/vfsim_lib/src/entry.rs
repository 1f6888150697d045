use chrono::NaiveDateTime;
use rand::Rng;

use crate::allocation::{Allocation, allocate};
use crate::error::{Result, VfsError};
use crate::types::{
    AllocationMethod, EntryId, MAX_BLOCKS, MAX_DIRS, MAX_FILES, Permission, is_reserved_name, new_id,
    now_stamp,
};

/// Rechaza nombres de directorio que chocan con la marca de origen de la papelera.
pub(crate) fn ensure_directory_name(name: &str) -> Result<()> {
    if is_reserved_name(name) {
        return Err(VfsError::denied(format!("'{}' es un nombre reservado", name)));
    }
    Ok(())
}

/// Referencia tipada a una entrada, sin propiedad. La usan el portapapeles
/// y las operaciones por lotes para distinguir archivo de directorio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRef {
    File(EntryId),
    Directory(EntryId),
}

/// Vista prestada de un hijo de un directorio.
#[derive(Debug, Clone, Copy)]
pub enum Listing<'a> {
    File(&'a FileEntry),
    Directory(&'a DirectoryEntry),
}

impl<'a> Listing<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Listing::File(f) => f.name(),
            Listing::Directory(d) => d.name(),
        }
    }
}

// --- ARCHIVOS ---

#[derive(Debug)]
pub struct FileEntry {
    id: EntryId,
    name: String,
    pub permissions: Permission,
    content: String,
    allocation: Allocation,
    /// Puramente cosmético: se sortea al crear el archivo.
    pub start_block: u64,
    pub modified_at: NaiveDateTime,
    pub(crate) trash_origin: Option<String>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, permissions: Permission) -> Self {
        let start_block = rand::thread_rng().gen_range(1..=MAX_BLOCKS - 10);
        Self {
            id: new_id(),
            name: name.into(),
            permissions,
            content: String::new(),
            allocation: allocate(""),
            start_block,
            modified_at: now_stamp(),
            trash_origin: None,
        }
    }

    /// Reconstruye un archivo cargado. La asignación se recalcula desde el
    /// contenido, no se confía en los valores guardados.
    pub(crate) fn from_parts(
        name: String,
        permissions: Permission,
        content: String,
        start_block: u64,
        modified_at: NaiveDateTime,
        trash_origin: Option<String>,
    ) -> Self {
        let allocation = allocate(&content);
        Self {
            id: new_id(),
            name,
            permissions,
            content,
            allocation,
            start_block,
            modified_at,
            trash_origin,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn size_bytes(&self) -> u64 {
        self.allocation.size_bytes
    }

    pub fn block_count(&self) -> u64 {
        self.allocation.block_count
    }

    pub fn allocation_method(&self) -> AllocationMethod {
        self.allocation.method
    }

    pub fn trash_origin(&self) -> Option<&str> {
        self.trash_origin.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        self.permissions == Permission::ReadOnly
    }

    pub fn set_content(&mut self, new_content: impl Into<String>) {
        self.content = new_content.into();
        self.touch();
    }

    pub fn append_content(&mut self, more: &str) {
        self.content.push_str(more);
        self.touch();
    }

    fn touch(&mut self) {
        self.allocation = allocate(&self.content);
        self.modified_at = now_stamp();
    }

    /// Copia independiente con ID nuevo. Las marcas de papelera no se copian.
    pub fn deep_copy(&self) -> FileEntry {
        FileEntry {
            id: new_id(),
            name: self.name.clone(),
            permissions: self.permissions,
            content: self.content.clone(),
            allocation: self.allocation,
            start_block: self.start_block,
            modified_at: self.modified_at,
            trash_origin: None,
        }
    }
}

// --- DIRECTORIOS ---

#[derive(Debug)]
pub struct DirectoryEntry {
    id: EntryId,
    name: String,
    files: Vec<FileEntry>,
    subdirectories: Vec<DirectoryEntry>,
    pub created_at: NaiveDateTime,
    pub(crate) trash_origin: Option<String>,
    /// Directorio exacto al que volver al restaurar. Relación sin propiedad:
    /// solo un ID, nunca se recorre para liberar nada.
    pub(crate) trash_parent: Option<EntryId>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            files: Vec::new(),
            subdirectories: Vec::new(),
            created_at: now_stamp(),
            trash_origin: None,
            trash_parent: None,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        files: Vec<FileEntry>,
        subdirectories: Vec<DirectoryEntry>,
        created_at: NaiveDateTime,
        trash_origin: Option<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name,
            files,
            subdirectories,
            created_at,
            trash_origin,
            trash_parent: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn subdirectories(&self) -> &[DirectoryEntry] {
        &self.subdirectories
    }

    pub fn trash_origin(&self) -> Option<&str> {
        self.trash_origin.as_deref()
    }

    pub fn trash_parent(&self) -> Option<EntryId> {
        self.trash_parent
    }

    pub(crate) fn subdirectories_mut(&mut self) -> &mut [DirectoryEntry] {
        &mut self.subdirectories
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn clear_trash_marks(&mut self) {
        self.trash_origin = None;
        self.trash_parent = None;
    }

    pub fn file(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn file_mut(&mut self, name: &str) -> Option<&mut FileEntry> {
        self.files.iter_mut().find(|f| f.name == name)
    }

    pub fn subdirectory(&self, name: &str) -> Option<&DirectoryEntry> {
        self.subdirectories.iter().find(|d| d.name == name)
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.file(name).is_some()
    }

    pub fn has_subdirectory(&self, name: &str) -> bool {
        self.subdirectory(name).is_some()
    }

    /// Hijos en el orden en que se muestran: primero directorios, luego archivos.
    pub fn entries(&self) -> Vec<Listing<'_>> {
        self.subdirectories
            .iter()
            .map(Listing::Directory)
            .chain(self.files.iter().map(Listing::File))
            .collect()
    }

    // --- CRUD DE UN NIVEL ---

    pub fn create_file(&mut self, name: &str, permissions: Permission) -> Result<&mut FileEntry> {
        if self.files.len() >= MAX_FILES {
            return Err(VfsError::CapacityExceeded { dir: self.name.clone(), limit: MAX_FILES });
        }
        if self.has_file(name) {
            return Err(VfsError::exists(name));
        }
        let idx = self.files.len();
        self.files.push(FileEntry::new(name, permissions));
        log::debug!("Archivo '{}' creado en '{}'", name, self.name);
        Ok(&mut self.files[idx])
    }

    pub fn create_subdirectory(&mut self, name: &str) -> Result<&mut DirectoryEntry> {
        ensure_directory_name(name)?;
        if self.subdirectories.len() >= MAX_DIRS {
            return Err(VfsError::CapacityExceeded { dir: self.name.clone(), limit: MAX_DIRS });
        }
        if self.has_subdirectory(name) {
            return Err(VfsError::exists(name));
        }
        let idx = self.subdirectories.len();
        self.subdirectories.push(DirectoryEntry::new(name));
        log::debug!("Directorio '{}' creado en '{}'", name, self.name);
        Ok(&mut self.subdirectories[idx])
    }

    pub fn rename_file(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.has_file(old) {
            return Err(VfsError::not_found(old));
        }
        if self.has_file(new) {
            return Err(VfsError::exists(new));
        }
        if let Some(file) = self.file_mut(old) {
            file.name = new.to_string();
        }
        Ok(())
    }

    pub fn rename_subdirectory(&mut self, old: &str, new: &str) -> Result<()> {
        if !self.has_subdirectory(old) {
            return Err(VfsError::not_found(old));
        }
        ensure_directory_name(new)?;
        if self.has_subdirectory(new) {
            return Err(VfsError::exists(new));
        }
        if let Some(dir) = self.subdirectories.iter_mut().find(|d| d.name == old) {
            dir.name = new.to_string();
        }
        Ok(())
    }

    /// Busca por nombre en orden: primero archivos, luego directorios.
    /// Los nombres desconocidos se ignoran.
    pub fn select(&self, names: &[&str]) -> Vec<EntryRef> {
        names
            .iter()
            .filter_map(|name| {
                if let Some(f) = self.file(name) {
                    Some(EntryRef::File(f.id))
                } else {
                    self.subdirectory(name).map(|d| EntryRef::Directory(d.id))
                }
            })
            .collect()
    }

    /// Búsqueda sin distinguir mayúsculas en los hijos directos.
    pub fn search(&self, query: &str) -> Vec<Listing<'_>> {
        let query = query.to_lowercase();
        self.entries()
            .into_iter()
            .filter(|entry| entry.name().to_lowercase().contains(&query))
            .collect()
    }

    // --- MOVIMIENTOS (sin validar reglas de sesión) ---

    pub(crate) fn take_file(&mut self, name: &str) -> Result<FileEntry> {
        let pos = self.files.iter().position(|f| f.name == name).ok_or_else(|| VfsError::not_found(name))?;
        Ok(self.files.remove(pos))
    }

    pub(crate) fn take_subdirectory(&mut self, name: &str) -> Result<DirectoryEntry> {
        let pos = self
            .subdirectories
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| VfsError::not_found(name))?;
        Ok(self.subdirectories.remove(pos))
    }

    pub(crate) fn take_file_by_id(&mut self, id: EntryId) -> Option<FileEntry> {
        let pos = self.files.iter().position(|f| f.id == id)?;
        Some(self.files.remove(pos))
    }

    pub(crate) fn take_subdirectory_by_id(&mut self, id: EntryId) -> Option<DirectoryEntry> {
        let pos = self.subdirectories.iter().position(|d| d.id == id)?;
        Some(self.subdirectories.remove(pos))
    }

    /// Inserta sin comprobar capacidad (restaurar y pegar no la comprueban).
    pub(crate) fn attach_file(&mut self, file: FileEntry) -> std::result::Result<(), FileEntry> {
        if self.has_file(&file.name) {
            return Err(file);
        }
        self.files.push(file);
        Ok(())
    }

    pub(crate) fn attach_subdirectory(&mut self, dir: DirectoryEntry) -> std::result::Result<(), DirectoryEntry> {
        if self.has_subdirectory(&dir.name) {
            return Err(dir);
        }
        self.subdirectories.push(dir);
        Ok(())
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.files.len() + self.subdirectories.len();
        self.files.clear();
        self.subdirectories.clear();
        removed
    }

    // --- RECORRIDOS ---

    /// Primera coincidencia en profundidad, empezando por este directorio.
    pub fn find_by_name(&self, name: &str) -> Option<&DirectoryEntry> {
        if self.name == name {
            return Some(self);
        }
        self.subdirectories.iter().find_map(|d| d.find_by_name(name))
    }

    pub fn find_by_id(&self, id: EntryId) -> Option<&DirectoryEntry> {
        if self.id == id {
            return Some(self);
        }
        self.subdirectories.iter().find_map(|d| d.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: EntryId) -> Option<&mut DirectoryEntry> {
        if self.id == id {
            return Some(self);
        }
        self.subdirectories.iter_mut().find_map(|d| d.find_by_id_mut(id))
    }

    pub fn find_file_by_id(&self, id: EntryId) -> Option<&FileEntry> {
        self.files
            .iter()
            .find(|f| f.id == id)
            .or_else(|| self.subdirectories.iter().find_map(|d| d.find_file_by_id(id)))
    }

    /// Verdadero si `id` es este directorio o cualquiera de sus descendientes.
    pub fn contains_directory(&self, id: EntryId) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Copia recursiva: todo el subárbol recibe IDs nuevos y no comparte nada
    /// con el original.
    pub fn deep_copy(&self) -> DirectoryEntry {
        DirectoryEntry {
            id: new_id(),
            name: self.name.clone(),
            files: self.files.iter().map(FileEntry::deep_copy).collect(),
            subdirectories: self.subdirectories.iter().map(DirectoryEntry::deep_copy).collect(),
            created_at: self.created_at,
            trash_origin: None,
            trash_parent: None,
        }
    }

    /// Bytes totales del subárbol.
    pub fn total_size(&self) -> u64 {
        let own: u64 = self.files.iter().map(FileEntry::size_bytes).sum();
        own + self.subdirectories.iter().map(DirectoryEntry::total_size).sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_mutation_rederives_allocation() {
        let mut file = FileEntry::new("a.txt", Permission::ReadWrite);
        assert_eq!(file.block_count(), 0);
        assert_eq!(file.allocation_method(), AllocationMethod::Contiguous);

        file.set_content("x".repeat(3000));
        assert_eq!(file.size_bytes(), 3000);
        assert_eq!(file.block_count(), 6);
        assert_eq!(file.allocation_method(), AllocationMethod::Linked);

        file.append_content(&"y".repeat(8000));
        assert_eq!(file.allocation_method(), AllocationMethod::Indexed);

        file.set_content("");
        assert_eq!(file.block_count(), 0);
        assert_eq!(file.allocation_method(), AllocationMethod::Contiguous);
    }

    #[test]
    fn test_start_block_range() {
        for _ in 0..50 {
            let file = FileEntry::new("r", Permission::ReadWrite);
            assert!((1..=MAX_BLOCKS - 10).contains(&file.start_block));
        }
    }

    #[test]
    fn test_create_file_rules() {
        let mut dir = DirectoryEntry::new("Docs");
        dir.create_file("a.txt", Permission::ReadWrite).unwrap();
        assert_eq!(dir.create_file("a.txt", Permission::ReadOnly).unwrap_err(), VfsError::exists("a.txt"));

        for i in 1..MAX_FILES {
            dir.create_file(&format!("f{}", i), Permission::ReadWrite).unwrap();
        }
        let err = dir.create_file("overflow", Permission::ReadWrite).unwrap_err();
        assert!(matches!(err, VfsError::CapacityExceeded { limit: MAX_FILES, .. }));
    }

    #[test]
    fn test_create_subdirectory_capacity() {
        let mut dir = DirectoryEntry::new("Docs");
        for i in 0..MAX_DIRS {
            dir.create_subdirectory(&format!("d{}", i)).unwrap();
        }
        assert!(matches!(
            dir.create_subdirectory("extra").unwrap_err(),
            VfsError::CapacityExceeded { limit: MAX_DIRS, .. }
        ));
        assert!(matches!(dir.create_subdirectory("d0").unwrap_err(), VfsError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_files_and_directories_share_names() {
        // La unicidad es por tipo
        let mut dir = DirectoryEntry::new("Docs");
        dir.create_file("notes", Permission::ReadWrite).unwrap();
        dir.create_subdirectory("notes").unwrap();
        assert_eq!(dir.entries().len(), 2);
    }

    #[test]
    fn test_rename() {
        let mut dir = DirectoryEntry::new("Docs");
        dir.create_file("a.txt", Permission::ReadWrite).unwrap();
        dir.create_file("b.txt", Permission::ReadWrite).unwrap();
        dir.create_subdirectory("sub").unwrap();

        assert_eq!(dir.rename_file("zzz", "c.txt").unwrap_err(), VfsError::not_found("zzz"));
        assert_eq!(dir.rename_file("a.txt", "b.txt").unwrap_err(), VfsError::exists("b.txt"));
        dir.rename_file("a.txt", "c.txt").unwrap();
        assert!(dir.has_file("c.txt") && !dir.has_file("a.txt"));

        dir.rename_subdirectory("sub", "other").unwrap();
        assert!(dir.has_subdirectory("other"));
    }

    #[test]
    fn test_find_and_contains() {
        let mut root = DirectoryEntry::new("Documents");
        let reports = root.create_subdirectory("Reports").unwrap();
        let q1_id = reports.create_subdirectory("Q1").unwrap().id();

        let found = root.find_by_name("Q1").unwrap();
        assert_eq!(found.id(), q1_id);
        assert!(root.contains_directory(q1_id));

        let reports = root.subdirectory("Reports").unwrap();
        assert!(reports.contains_directory(reports.id()));
        assert!(!reports.subdirectory("Q1").unwrap().contains_directory(reports.id()));
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let mut root = DirectoryEntry::new("src");
        let sub = root.create_subdirectory("inner").unwrap();
        sub.create_file("x.txt", Permission::ReadWrite).unwrap().set_content("hola");

        let mut copy = root.deep_copy();
        assert_ne!(copy.id(), root.id());
        let copied_inner = copy.subdirectories[0].id();
        assert_ne!(copied_inner, root.subdirectories[0].id());

        copy.subdirectories[0].file_mut("x.txt").unwrap().set_content("cambiado");
        assert_eq!(root.subdirectories[0].file("x.txt").unwrap().content(), "hola");
        assert!(root.find_by_id(copied_inner).is_none());
    }

    #[test]
    fn test_select_and_search() {
        let mut dir = DirectoryEntry::new("Docs");
        let file_id = dir.create_file("Report.txt", Permission::ReadWrite).unwrap().id();
        let dir_id = dir.create_subdirectory("reports").unwrap().id();

        let picked = dir.select(&["Report.txt", "missing", "reports"]);
        assert_eq!(picked, vec![EntryRef::File(file_id), EntryRef::Directory(dir_id)]);

        let hits: Vec<&str> = dir.search("REPORT").iter().map(|e| e.name()).collect();
        assert_eq!(hits, vec!["reports", "Report.txt"]);
    }
}
