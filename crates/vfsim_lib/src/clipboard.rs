use crate::entry::{DirectoryEntry, EntryRef, FileEntry};
use crate::error::{Result, VfsError};
use crate::session::Session;
use crate::types::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    Cut,
    Copy,
}

/// Ranura única del portapapeles. Guarda referencias (IDs), nunca las
/// entradas: el contenido se resuelve en el momento de pegar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipboard {
    pub items: Vec<EntryRef>,
    pub op: ClipOp,
    pub source: EntryId,
}

impl Session {
    /// Sobrescribe el portapapeles sin condiciones.
    pub fn copy_to_clipboard(&mut self, items: Vec<EntryRef>, op: ClipOp, source: EntryId) {
        log::debug!("Portapapeles: {} entradas ({:?})", items.len(), op);
        self.clipboard = Some(Clipboard { items, op, source });
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard = None;
    }

    pub fn find_file(&self, id: EntryId) -> Option<&FileEntry> {
        self.roots().find_map(|r| r.find_file_by_id(id))
    }

    pub fn can_paste(&self, target: Option<EntryId>) -> bool {
        self.check_paste(target).is_ok()
    }

    /// Igual que `can_paste`, pero explica el motivo del rechazo.
    pub fn check_paste(&self, target: Option<EntryId>) -> Result<()> {
        let clip = self
            .clipboard
            .as_ref()
            .filter(|c| !c.items.is_empty())
            .ok_or_else(|| VfsError::invalid("el portapapeles está vacío"))?;
        let target_id = target.ok_or_else(|| VfsError::invalid("no hay directorio destino"))?;
        let target = self.dir(target_id)?;

        for item in &clip.items {
            match *item {
                EntryRef::File(id) => {
                    let file = self.clipped_file(clip, id)?;
                    if target.has_file(file.name()) {
                        return Err(VfsError::exists(format!("{} en '{}'", file.name(), target.name())));
                    }
                }
                EntryRef::Directory(id) => {
                    let dir = self.clipped_directory(clip, id)?;
                    // Recorrido de arriba hacia abajo desde el elemento cortado
                    if clip.op == ClipOp::Cut && dir.contains_directory(target_id) {
                        return Err(VfsError::CyclicMove(dir.name().to_string()));
                    }
                    if target.has_subdirectory(dir.name()) {
                        return Err(VfsError::exists(format!("{} en '{}'", dir.name(), target.name())));
                    }
                }
            }
        }
        Ok(())
    }

    /// Al cortar, el elemento debe seguir en su directorio de origen.
    /// Al copiar, basta con que exista en algún lugar del bosque.
    fn clipped_file(&self, clip: &Clipboard, id: EntryId) -> Result<&FileEntry> {
        let found = match clip.op {
            ClipOp::Cut => self.dir(clip.source)?.files().iter().find(|f| f.id() == id),
            ClipOp::Copy => self.find_file(id),
        };
        found.ok_or_else(|| VfsError::not_found(format!("archivo {}", id)))
    }

    fn clipped_directory(&self, clip: &Clipboard, id: EntryId) -> Result<&DirectoryEntry> {
        let found = match clip.op {
            ClipOp::Cut => self.dir(clip.source)?.subdirectories().iter().find(|d| d.id() == id),
            ClipOp::Copy => self.directory(id),
        };
        found.ok_or_else(|| VfsError::not_found(format!("directorio {}", id)))
    }

    /// Pega en `target`. Si la comprobación previa falla, el portapapeles no
    /// se toca; si no, se vacía al terminar (pegado de un solo uso).
    pub fn paste(&mut self, target: EntryId) -> Result<usize> {
        self.check_paste(Some(target))?;
        let Some(clip) = self.clipboard.take() else {
            return Err(VfsError::invalid("el portapapeles está vacío"));
        };

        let pasted = match clip.op {
            ClipOp::Cut => self.paste_moved(&clip, target)?,
            ClipOp::Copy => self.paste_copies(&clip, target)?,
        };

        log::debug!("Pegadas {} entradas ({:?})", pasted, clip.op);
        Ok(pasted)
    }

    /// Mueve la entrada original: conserva su ID y sus marcas de papelera.
    /// `check_paste` ya descartó los choques de nombre en el destino.
    fn paste_moved(&mut self, clip: &Clipboard, target: EntryId) -> Result<usize> {
        let mut pasted = 0;
        for item in &clip.items {
            match *item {
                EntryRef::File(id) => {
                    let Some(file) = self.dir_mut(clip.source)?.take_file_by_id(id) else { continue };
                    self.dir_mut(target)?
                        .attach_file(file)
                        .map_err(|f| VfsError::exists(f.name().to_string()))?;
                }
                EntryRef::Directory(id) => {
                    let Some(dir) = self.dir_mut(clip.source)?.take_subdirectory_by_id(id) else { continue };
                    self.dir_mut(target)?
                        .attach_subdirectory(dir)
                        .map_err(|d| VfsError::exists(d.name().to_string()))?;
                }
            }
            pasted += 1;
        }
        Ok(pasted)
    }

    fn paste_copies(&mut self, clip: &Clipboard, target: EntryId) -> Result<usize> {
        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for item in &clip.items {
            match *item {
                EntryRef::File(id) => files.extend(self.find_file(id).map(FileEntry::deep_copy)),
                EntryRef::Directory(id) => dirs.extend(self.directory(id).map(DirectoryEntry::deep_copy)),
            }
        }

        // Una copia que choca con otra del mismo lote simplemente se descarta
        let dest = self.dir_mut(target)?;
        let mut pasted = 0;
        for file in files {
            if dest.attach_file(file).is_ok() {
                pasted += 1;
            }
        }
        for dir in dirs {
            if dest.attach_subdirectory(dir).is_ok() {
                pasted += 1;
            }
        }
        Ok(pasted)
    }
}
