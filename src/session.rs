use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{AppError, require_field};
use crate::gateway::{ApiGateway, AuthSession};
use crate::models::User;

/// Durable home for the two session keys: the raw bearer token and the
/// serialized user profile. The session store is the only writer; reads are
/// open to anyone holding the port.
pub trait SessionStorage: Send + Sync {
    fn read_token(&self) -> Option<String>;
    fn read_user(&self) -> Option<User>;
    fn write(&self, token: &str, user: &User) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

/// File-backed storage: `<dir>/token` holds the bearer token verbatim,
/// `<dir>/user.json` the serialized profile.
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join("token")
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join("user.json")
    }
}

impl SessionStorage for FileSessionStorage {
    fn read_token(&self) -> Option<String> {
        let raw = fs::read_to_string(self.token_path()).ok()?;
        let token = raw.trim().to_string();
        if token.is_empty() { None } else { Some(token) }
    }

    fn read_user(&self) -> Option<User> {
        // A malformed profile reads as absent rather than failing startup.
        let raw = fs::read_to_string(self.user_path()).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write(&self, token: &str, user: &User) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.token_path(), token)?;
        fs::write(self.user_path(), serde_json::to_string(user)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        for path in [self.token_path(), self.user_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Ephemeral storage, mainly for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySessionStorage {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    token: Option<String>,
    user: Option<User>,
}

impl SessionStorage for MemorySessionStorage {
    fn read_token(&self) -> Option<String> {
        self.state.lock().unwrap().token.clone()
    }

    fn read_user(&self) -> Option<User> {
        self.state.lock().unwrap().user.clone()
    }

    fn write(&self, token: &str, user: &User) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.token = Some(token.to_string());
        state.user = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.token = None;
        state.user = None;
        Ok(())
    }
}

/// Holds the authenticated identity for the current process: token and user
/// live together in memory, mirrored to durable storage on every successful
/// login or register. Token validity is never checked client-side; a stale
/// token simply fails on its next request.
pub struct SessionStore {
    gateway: Arc<dyn ApiGateway>,
    storage: Arc<dyn SessionStorage>,
    token: Option<String>,
    user: Option<User>,
}

impl SessionStore {
    /// Rehydrates both fields from durable storage.
    pub fn load(gateway: Arc<dyn ApiGateway>, storage: Arc<dyn SessionStorage>) -> Self {
        let token = storage.read_token();
        let user = storage.read_user();
        Self {
            gateway,
            storage,
            token,
            user,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        require_field("email", email)?;
        require_field("password", password)?;
        let auth = self.gateway.login(email, password).await?;
        self.install(auth)
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        require_field("name", name)?;
        require_field("email", email)?;
        require_field("password", password)?;
        let auth = self.gateway.register(name, email, password).await?;
        self.install(auth)
    }

    /// Clears memory and both storage keys unconditionally. Never touches
    /// the network.
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.token = None;
        self.user = None;
        self.storage.clear()
    }

    pub async fn delete_account(&mut self) -> Result<(), AppError> {
        let token = self.token.clone().ok_or(AppError::NotAuthenticated)?;
        self.gateway.delete_account(&token).await?;
        self.logout()
    }

    fn install(&mut self, auth: AuthSession) -> Result<(), AppError> {
        self.storage.write(&auth.token, &auth.user)?;
        self.token = Some(auth.token);
        self.user = Some(auth.user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn memory_storage_holds_and_clears_both_keys_together() {
        let storage = MemorySessionStorage::default();
        assert!(storage.read_token().is_none());
        assert!(storage.read_user().is_none());

        storage.write("tok-1", &user()).unwrap();
        assert_eq!(storage.read_token(), Some("tok-1".to_string()));
        assert_eq!(storage.read_user(), Some(user()));

        storage.clear().unwrap();
        assert!(storage.read_token().is_none());
        assert!(storage.read_user().is_none());
    }
}
