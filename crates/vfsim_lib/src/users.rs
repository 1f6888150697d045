use crate::error::{Result, VfsError};
use crate::session::Session;
use crate::types::{MAX_USERS, Role, User};

impl Session {
    pub(crate) fn require_admin(&self) -> Result<()> {
        if !self.current_user.is_admin() {
            return Err(VfsError::denied("solo ADMIN puede borrar"));
        }
        Ok(())
    }

    /// Registra un usuario nuevo y lo deja como usuario activo.
    pub fn add_user(&mut self, username: &str, role: Role) -> Result<()> {
        let username = validate_username(username)?;
        if self.users.iter().any(|u| u.username.eq_ignore_ascii_case(username)) {
            return Err(VfsError::exists(username));
        }
        if self.users.len() >= MAX_USERS {
            return Err(VfsError::CapacityExceeded { dir: "usuarios".to_string(), limit: MAX_USERS });
        }

        let user = User::new(username, role);
        self.users.push(user.clone());
        self.current_user = user;
        log::info!("Usuario '{}' ({}) creado", username, role);
        Ok(())
    }

    /// Bosque por defecto con un único ADMIN de nombre dado.
    pub fn with_admin(username: &str) -> Result<Session> {
        let admin = User::new(validate_username(username)?, Role::Admin);
        let mut session = Session::new();
        session.users = vec![admin.clone()];
        session.current_user = admin;
        Ok(session)
    }

    pub fn switch_user(&mut self, username: &str) -> Result<()> {
        let user = self
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or_else(|| VfsError::not_found(username))?;
        log::info!("Sesión cambiada a '{}' ({})", user.username, user.role);
        self.current_user = user;
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.chars().count() < 2 {
        return Err(VfsError::invalid("el nombre de usuario necesita al menos 2 caracteres"));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(VfsError::invalid("solo letras, números, guiones y guiones bajos"));
    }
    Ok(username)
}
