use std::fmt;

use crate::allocation::format_size;
use crate::entry::{DirectoryEntry, FileEntry, Listing};
use crate::types::{AllocationMethod, Permission, TIMESTAMP_FORMAT};

/// Resumen de un archivo tal como lo muestra el diálogo de detalles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileView {
    pub name: String,
    pub location: String,
    pub size: String,
    pub blocks: u64,
    pub method: AllocationMethod,
    pub start_block: u64,
    pub permissions: Permission,
    pub modified: String,
    pub trash_origin: Option<String>,
}

impl FileView {
    pub fn new(file: &FileEntry, location: &str) -> Self {
        Self {
            name: file.name().to_string(),
            location: location.to_string(),
            size: format_size(file.size_bytes()),
            blocks: file.block_count(),
            method: file.allocation_method(),
            start_block: file.start_block,
            permissions: file.permissions,
            modified: file.modified_at.format(TIMESTAMP_FORMAT).to_string(),
            trash_origin: file.trash_origin().map(str::to_string),
        }
    }
}

impl fmt::Display for FileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nombre:       {}", self.name)?;
        writeln!(f, "Ubicación:    {}", self.location)?;
        writeln!(f, "Tamaño:       {}", self.size)?;
        writeln!(f, "Bloques:      {} ({})", self.blocks, self.method)?;
        writeln!(f, "Bloque ini.:  {}", self.start_block)?;
        writeln!(f, "Permisos:     {}", self.permissions)?;
        write!(f, "Modificado:   {}", self.modified)?;
        if let Some(origin) = &self.trash_origin {
            write!(f, "\nOrigen:       {}", origin)?;
        }
        Ok(())
    }
}

/// Una línea de listado: `[D]`/`[F]`, nombre, tamaño y fecha.
pub fn listing_line(entry: &Listing<'_>) -> String {
    match entry {
        Listing::Directory(dir) => format!(
            "[D] {:<24} {:>10}  {}",
            dir.name(),
            directory_summary(dir),
            dir.created_at.format(TIMESTAMP_FORMAT)
        ),
        Listing::File(file) => format!(
            "[F] {:<24} {:>10}  {}{}",
            file.name(),
            format_size(file.size_bytes()),
            file.modified_at.format(TIMESTAMP_FORMAT),
            if file.is_read_only() { "  (solo lectura)" } else { "" }
        ),
    }
}

fn directory_summary(dir: &DirectoryEntry) -> String {
    format!("{} elem.", dir.files().len() + dir.subdirectories().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_view() {
        let mut file = FileEntry::new("a.txt", Permission::ReadOnly);
        file.set_content("x".repeat(3000));
        let view = FileView::new(&file, "Documents");
        assert_eq!(view.size, "2.9 KB");
        assert_eq!(view.blocks, 6);
        assert_eq!(view.method, AllocationMethod::Linked);
        let text = view.to_string();
        assert!(text.contains("Documents"));
        assert!(!text.contains("Origen"));
    }

    #[test]
    fn test_listing_line() {
        let mut dir = DirectoryEntry::new("Docs");
        dir.create_subdirectory("Sub").unwrap();
        dir.create_file("ro.txt", Permission::ReadOnly).unwrap();
        let lines: Vec<String> = dir.entries().iter().map(listing_line).collect();
        assert!(lines[0].starts_with("[D] Sub"));
        assert!(lines[1].starts_with("[F] ro.txt"));
        assert!(lines[1].ends_with("(solo lectura)"));
    }
}
