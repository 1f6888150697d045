use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entry::{DirectoryEntry, FileEntry};
use crate::session::Session;
use crate::types::{AllocationMethod, Permission, ROOT_ORIGIN, TRASH_NAME, User, stamp};

// --- FORMATO PERSISTIDO ---
// Las referencias al padre (trash_parent) nunca se guardan: se reconstruyen
// al cargar buscando el directorio por nombre.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub name: String,
    pub start_block: u64,
    #[serde(default)]
    pub block_count: u64,
    pub permissions: u8,
    #[serde(default = "default_allocation")]
    pub allocation: AllocationMethod,
    pub content: String,
    #[serde(with = "stamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub original_location: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DirectoryRecord {
    pub name: String,
    pub files: Vec<FileRecord>,
    pub subdirectories: Vec<DirectoryRecord>,
    #[serde(with = "stamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub original_location: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StateRecord {
    #[serde(default)]
    pub current_user: User,
    #[serde(default)]
    pub user_list: Option<Vec<User>>,
    pub root_directories: Vec<DirectoryRecord>,
}

fn default_allocation() -> AllocationMethod {
    AllocationMethod::Contiguous
}

impl From<&FileEntry> for FileRecord {
    fn from(file: &FileEntry) -> Self {
        Self {
            name: file.name().to_string(),
            start_block: file.start_block,
            block_count: file.block_count(),
            permissions: file.permissions.as_flag(),
            allocation: file.allocation_method(),
            content: file.content().to_string(),
            timestamp: file.modified_at,
            size_bytes: file.size_bytes(),
            original_location: file.trash_origin().map(str::to_string),
        }
    }
}

impl From<&DirectoryEntry> for DirectoryRecord {
    fn from(dir: &DirectoryEntry) -> Self {
        Self {
            name: dir.name().to_string(),
            files: dir.files().iter().map(FileRecord::from).collect(),
            subdirectories: dir.subdirectories().iter().map(DirectoryRecord::from).collect(),
            timestamp: dir.created_at,
            original_location: dir.trash_origin().map(str::to_string),
        }
    }
}

impl FileRecord {
    /// `block_count`, `size_bytes` y `allocation` se ignoran: se derivan de nuevo.
    pub fn into_entry(self) -> FileEntry {
        FileEntry::from_parts(
            self.name,
            Permission::from_flag(self.permissions),
            self.content,
            self.start_block,
            self.timestamp,
            self.original_location,
        )
    }
}

impl DirectoryRecord {
    pub fn into_entry(self) -> DirectoryEntry {
        DirectoryEntry::from_parts(
            self.name,
            self.files.into_iter().map(FileRecord::into_entry).collect(),
            self.subdirectories.into_iter().map(DirectoryRecord::into_entry).collect(),
            self.timestamp,
            self.original_location,
        )
    }
}

impl Session {
    pub fn to_record(&self) -> StateRecord {
        StateRecord {
            current_user: self.current_user.clone(),
            user_list: Some(self.users.clone()),
            root_directories: self.roots().map(DirectoryRecord::from).collect(),
        }
    }

    /// Reconstruye la sesión y vuelve a enlazar cada directorio de la
    /// papelera con su padre original.
    pub fn from_record(record: StateRecord) -> Session {
        let mut roots = Vec::new();
        let mut trash = None;
        for dir in record.root_directories {
            if dir.name == TRASH_NAME && trash.is_none() {
                trash = Some(dir.into_entry());
            } else {
                roots.push(dir.into_entry());
            }
        }
        let trash = trash.unwrap_or_else(|| {
            log::warn!("El estado no tiene papelera; se crea una vacía");
            DirectoryEntry::new(TRASH_NAME)
        });

        let users = match record.user_list {
            Some(list) if !list.is_empty() => list,
            _ => {
                log::warn!("No hay lista de usuarios guardada; se mantiene el admin por defecto");
                vec![User::default()]
            }
        };

        let mut session = Session {
            roots,
            trash,
            users,
            current_user: record.current_user,
            clipboard: None,
        };
        session.relink_trash_parents();
        session
    }

    fn relink_trash_parents(&mut self) {
        let links: Vec<Option<_>> = self
            .trash
            .subdirectories()
            .iter()
            .map(|dir| match dir.trash_origin() {
                Some(origin) if origin != ROOT_ORIGIN => self
                    .find_directory(origin)
                    .map(|parent| parent.id())
                    // Un directorio no puede ser su propio destino
                    .filter(|id| !dir.contains_directory(*id)),
                _ => None,
            })
            .collect();

        for (dir, parent) in self.trash.subdirectories_mut().iter_mut().zip(links) {
            dir.trash_parent = parent;
            if parent.is_none() && dir.trash_origin().is_some_and(|o| o != ROOT_ORIGIN) {
                log::warn!("No se encontró el origen de '{}' en la papelera", dir.name());
            }
        }
    }
}
