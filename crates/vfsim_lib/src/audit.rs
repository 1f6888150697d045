use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::allocation::allocate;
use crate::record::{DirectoryRecord, FileRecord, StateRecord};
use crate::types::{MAX_BLOCKS, MAX_DIRS, MAX_FILES, ROOT_ORIGIN, TRASH_NAME, is_reserved_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Se corrige solo al cargar (p. ej. la asignación se recalcula)
    Warning,
    /// El estado cargado violará alguna regla del motor
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Default)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
    pub directories: usize,
    pub files: usize,
}

impl AuditReport {
    pub fn errors(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Error).count()
    }

    pub fn warnings(&self) -> usize {
        self.findings.iter().filter(|f| f.severity == Severity::Warning).count()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.findings.push(Finding { severity, path: path.to_string(), message: message.into() });
    }
}

/// Revisa un estado guardado sin cargarlo en una sesión.
pub fn audit(record: &StateRecord) -> AuditReport {
    let mut report = AuditReport::default();

    // 1. Usuarios
    let users = record.user_list.as_deref().unwrap_or_default();
    if !users.is_empty() && !users.iter().any(|u| u.username == record.current_user.username) {
        report.push(
            Severity::Error,
            "<usuarios>",
            format!("el usuario actual '{}' no está en la lista", record.current_user.username),
        );
    }

    // 2. Raíces: duplicados y papelera
    check_duplicates(&mut report, "<raíz>", record.root_directories.iter().map(|d| d.name.as_str()), "directorio");
    let trash = record.root_directories.iter().find(|d| d.name == TRASH_NAME);
    if trash.is_none() {
        report.push(Severity::Warning, "<raíz>", "no existe la papelera; se creará vacía al cargar");
    }

    // 3. Recorrido completo
    for dir in &record.root_directories {
        walk(&mut report, dir, &dir.name, dir.name == TRASH_NAME);
    }

    // 4. Nombres de directorio repetidos: la búsqueda por nombre toma el primero
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for dir in &record.root_directories {
        count_names(dir, &mut seen);
    }
    let mut repeated: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    repeated.sort();
    for (name, n) in repeated {
        report.push(
            Severity::Warning,
            name,
            format!("{} directorios con este nombre; restaurar por nombre es ambiguo", n),
        );
    }

    // 5. Origen de lo que está en la papelera
    if let Some(trash) = trash {
        for file in &trash.files {
            let path = format!("{}/{}", TRASH_NAME, file.name);
            match &file.original_location {
                None => report.push(Severity::Warning, &path, "archivo sin ubicación original"),
                Some(origin) if find_directory(record, origin).is_none() => {
                    report.push(Severity::Warning, &path, format!("el origen '{}' no existe", origin))
                }
                Some(_) => {}
            }
        }
        for sub in &trash.subdirectories {
            let path = format!("{}/{}", TRASH_NAME, sub.name);
            match sub.original_location.as_deref() {
                None => report.push(Severity::Warning, &path, "directorio sin ubicación original"),
                Some(ROOT_ORIGIN) => {}
                Some(origin) if find_directory(record, origin).is_none() => report.push(
                    Severity::Error,
                    &path,
                    format!("el origen '{}' no existe; no se podrá restaurar", origin),
                ),
                Some(_) => {}
            }
        }
    }

    report
}

fn walk(report: &mut AuditReport, dir: &DirectoryRecord, path: &str, in_trash: bool) {
    report.directories += 1;
    report.files += dir.files.len();

    if is_reserved_name(&dir.name) {
        report.push(Severity::Error, path, "nombre reservado; lo que se borre de aquí volverá al nivel raíz");
    }

    // La papelera recibe lo que se borra sin límite de capacidad
    if !in_trash {
        if dir.files.len() > MAX_FILES {
            report.push(Severity::Error, path, format!("{} archivos (máximo {})", dir.files.len(), MAX_FILES));
        }
        if dir.subdirectories.len() > MAX_DIRS {
            report.push(
                Severity::Error,
                path,
                format!("{} subdirectorios (máximo {})", dir.subdirectories.len(), MAX_DIRS),
            );
        }
    }
    check_duplicates(report, path, dir.files.iter().map(|f| f.name.as_str()), "archivo");
    check_duplicates(report, path, dir.subdirectories.iter().map(|d| d.name.as_str()), "directorio");

    for file in &dir.files {
        check_file(report, file, &format!("{}/{}", path, file.name));
    }
    for sub in &dir.subdirectories {
        walk(report, sub, &format!("{}/{}", path, sub.name), in_trash);
    }
}

fn check_file(report: &mut AuditReport, file: &FileRecord, path: &str) {
    let derived = allocate(&file.content);
    if file.size_bytes != derived.size_bytes
        || file.block_count != derived.block_count
        || file.allocation != derived.method
    {
        report.push(
            Severity::Warning,
            path,
            format!(
                "asignación guardada ({} bytes, {} bloques, {}) no coincide con el contenido ({} bytes, {} bloques, {})",
                file.size_bytes, file.block_count, file.allocation,
                derived.size_bytes, derived.block_count, derived.method
            ),
        );
    }
    if file.start_block == 0 || file.start_block > MAX_BLOCKS {
        report.push(Severity::Warning, path, format!("bloque inicial {} fuera de rango", file.start_block));
    }
    if file.permissions > 1 {
        report.push(Severity::Warning, path, format!("permiso desconocido {}", file.permissions));
    }
}

fn check_duplicates<'a>(report: &mut AuditReport, path: &str, names: impl Iterator<Item = &'a str>, kind: &str) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            report.push(Severity::Error, path, format!("{} '{}' duplicado", kind, name));
        }
    }
}

fn count_names<'a>(dir: &'a DirectoryRecord, seen: &mut HashMap<&'a str, usize>) {
    *seen.entry(dir.name.as_str()).or_default() += 1;
    for sub in &dir.subdirectories {
        count_names(sub, seen);
    }
}

fn find_directory<'a>(record: &'a StateRecord, name: &str) -> Option<&'a DirectoryRecord> {
    fn find<'a>(dir: &'a DirectoryRecord, name: &str) -> Option<&'a DirectoryRecord> {
        if dir.name == name {
            return Some(dir);
        }
        dir.subdirectories.iter().find_map(|sub| find(sub, name))
    }
    record.root_directories.iter().find_map(|dir| find(dir, name))
}
