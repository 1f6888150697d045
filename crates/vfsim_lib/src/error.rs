use thiserror::Error;

/// Fallos esperados de las operaciones del motor. Ninguno es fatal:
/// la capa de presentación decide si mostrar un diálogo.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Ya existe: {0}")]
    AlreadyExists(String),
    #[error("Límite alcanzado en '{dir}' (máximo {limit})")]
    CapacityExceeded { dir: String, limit: usize },
    #[error("Permiso denegado: {0}")]
    PermissionDenied(String),
    #[error("Operación no válida aquí: {0}")]
    InvalidContext(String),
    #[error("No se puede mover '{0}' dentro de sí mismo")]
    CyclicMove(String),
    #[error("'{0}' no tiene ubicación original")]
    MissingOriginInfo(String),
}

pub type Result<T> = std::result::Result<T, VfsError>;

impl VfsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn denied(why: impl Into<String>) -> Self {
        Self::PermissionDenied(why.into())
    }

    pub fn invalid(why: impl Into<String>) -> Self {
        Self::InvalidContext(why.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = VfsError::CapacityExceeded { dir: "Docs".into(), limit: 100 };
        assert_eq!(err.to_string(), "Límite alcanzado en 'Docs' (máximo 100)");
        assert_eq!(VfsError::not_found("a.txt"), VfsError::NotFound("a.txt".into()));
    }
}
