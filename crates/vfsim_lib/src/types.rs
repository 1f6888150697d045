use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// --- CONSTANTES DE DISEÑO ---
pub const BYTES_PER_BLOCK: u64 = 512;
pub const MAX_FILES: usize = 100;
pub const MAX_DIRS: usize = 50;
pub const MAX_BLOCKS: u64 = 1000;
pub const MAX_USERS: usize = 10;

pub const TRASH_NAME: &str = "Trash";
/// Marca de origen para directorios raíz enviados a la papelera.
pub const ROOT_ORIGIN: &str = "Root";
/// Raíces que existen siempre y no se pueden renombrar ni borrar.
pub const SYSTEM_DIRECTORIES: [&str; 5] = ["Documents", "Media", "Projects", "System", TRASH_NAME];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DEFAULT_STATE_FILE: &str = "file_system_state.json";

/// Identificador interno de archivos y directorios. No se persiste.
pub type EntryId = Uuid;

pub fn new_id() -> EntryId {
    Uuid::new_v4()
}

pub fn is_system_directory(name: &str) -> bool {
    SYSTEM_DIRECTORIES.contains(&name)
}

/// Ningún directorio puede llamarse como la marca de origen de las raíces.
pub fn is_reserved_name(name: &str) -> bool {
    name == ROOT_ORIGIN
}

/// Hora actual con precisión de minutos (la misma que guarda el registro).
pub fn now_stamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

// --- ESTRUCTURAS PRINCIPALES ---

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMethod {
    Contiguous,
    Linked,
    Indexed,
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocationMethod::Contiguous => "Contiguous",
            AllocationMethod::Linked => "Linked",
            AllocationMethod::Indexed => "Indexed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    /// En el registro: 0 = solo lectura, 1 = lectura/escritura.
    pub fn as_flag(self) -> u8 {
        match self {
            Permission::ReadOnly => 0,
            Permission::ReadWrite => 1,
        }
    }

    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 { Permission::ReadOnly } else { Permission::ReadWrite }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::ReadOnly => f.write_str("Read-Only"),
            Permission::ReadWrite => f.write_str("Read-Write"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("USER"),
            Role::Admin => f.write_str("ADMIN"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self { username: username.into(), role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new("admin", Role::Admin)
    }
}

/// Serialización de fechas con el formato corto del registro.
pub mod stamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
