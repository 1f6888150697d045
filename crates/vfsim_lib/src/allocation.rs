use crate::types::{AllocationMethod, BYTES_PER_BLOCK};

/// Resultado de la política de asignación para un contenido dado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub size_bytes: u64,
    pub block_count: u64,
    pub method: AllocationMethod,
}

/// Calcula tamaño, bloques y método a partir del contenido.
/// Es la única fuente de estos tres valores: nunca se asignan a mano.
pub fn allocate(content: &str) -> Allocation {
    // El tamaño se mide en bytes UTF-8, no en caracteres
    let size_bytes = content.len() as u64;
    if size_bytes == 0 {
        return Allocation { size_bytes: 0, block_count: 0, method: AllocationMethod::Contiguous };
    }

    // Ceil div, con al menos un bloque
    let block_count = size_bytes.div_ceil(BYTES_PER_BLOCK).max(1);

    let method = match block_count {
        0..=5 => AllocationMethod::Contiguous,
        6..=20 => AllocationMethod::Linked,
        _ => AllocationMethod::Indexed,
    };

    Allocation { size_bytes, block_count, method }
}

/// Tamaño legible: bytes, KB o MB con un decimal.
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if size_bytes == 0 {
        "0 bytes".to_string()
    } else if size_bytes < KB {
        format!("{} bytes", size_bytes)
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(len: usize) -> String {
        "a".repeat(len)
    }

    #[test]
    fn test_empty_content() {
        let alloc = allocate("");
        assert_eq!(alloc.size_bytes, 0);
        assert_eq!(alloc.block_count, 0);
        assert_eq!(alloc.method, AllocationMethod::Contiguous);
    }

    #[test]
    fn test_method_boundaries() {
        // Límites en 5 y 20 bloques de 512 bytes
        assert_eq!(allocate(&text(1)).block_count, 1);
        assert_eq!(allocate(&text(1)).method, AllocationMethod::Contiguous);
        assert_eq!(allocate(&text(2560)).method, AllocationMethod::Contiguous);
        assert_eq!(allocate(&text(2560)).block_count, 5);

        assert_eq!(allocate(&text(2561)).method, AllocationMethod::Linked);
        assert_eq!(allocate(&text(2561)).block_count, 6);
        assert_eq!(allocate(&text(10240)).method, AllocationMethod::Linked);
        assert_eq!(allocate(&text(10240)).block_count, 20);

        assert_eq!(allocate(&text(10241)).method, AllocationMethod::Indexed);
        assert_eq!(allocate(&text(10241)).block_count, 21);
    }

    #[test]
    fn test_multibyte_content_counts_bytes() {
        // "ñ" ocupa 2 bytes en UTF-8
        let alloc = allocate("ñ");
        assert_eq!(alloc.size_bytes, 2);
        assert_eq!(alloc.block_count, 1);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
