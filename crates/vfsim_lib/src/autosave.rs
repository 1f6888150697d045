use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::session::Session;
use crate::store::StateStore;

/// Hilo que guarda la sesión compartida cada `interval` y una última vez al cerrarse.
pub struct AutoSaver {
    stop: Sender<()>,
    handle: Option<JoinHandle<bool>>,
}

impl AutoSaver {
    pub fn spawn(session: Arc<Mutex<Session>>, store: StateStore, interval: Duration) -> Self {
        log::info!("Autoguardado cada {}s en {:?}", interval.as_secs(), store.path());
        let (stop, rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        save_shared(&session, &store);
                    }
                    // Parada explícita o AutoSaver soltado
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            let saved = save_shared(&session, &store);
            log::debug!("Autoguardado detenido");
            saved
        });
        Self { stop, handle: Some(handle) }
    }

    /// Detiene el hilo y espera al guardado final. Devuelve si ese guardado se completó.
    pub fn shutdown(mut self) -> bool {
        self.finish()
    }

    fn finish(&mut self) -> bool {
        let Some(handle) = self.handle.take() else { return false };
        // Si el hilo ya salió, el canal está cerrado y el join basta
        if self.stop.send(()).is_err() {
            log::debug!("El hilo de autoguardado ya había terminado");
        }
        handle.join().unwrap_or_else(|_| {
            log::error!("El hilo de autoguardado terminó con pánico");
            false
        })
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Guarda la sesión compartida aunque el mutex esté envenenado. Los fallos
/// se registran y se devuelven como `false`.
pub fn save_shared(session: &Mutex<Session>, store: &StateStore) -> bool {
    let guard = match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    match guard.save(store) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Fallo el guardado en {:?}: {}", store.path(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Permission;
    use tempfile::tempdir;

    #[test]
    fn test_shutdown_performs_final_save() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let session = Arc::new(Mutex::new(Session::new()));

        let saver = AutoSaver::spawn(session.clone(), store.clone(), Duration::from_secs(3600));
        {
            let mut s = session.lock().unwrap();
            let docs = s.root("Documents").unwrap().id();
            s.create_file(docs, "late.txt", Permission::ReadWrite).unwrap();
        }
        assert!(saver.shutdown());

        let loaded = Session::load_or_default(&store);
        assert!(loaded.root("Documents").unwrap().has_file("late.txt"));
    }

    #[test]
    fn test_periodic_save() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let session = Arc::new(Mutex::new(Session::new()));

        let saver = AutoSaver::spawn(session, store.clone(), Duration::from_millis(20));
        let mut waited = 0;
        while !store.exists() && waited < 200 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        assert!(store.exists());
        drop(saver);
    }

    #[test]
    fn test_failed_final_save_is_reported() {
        let dir = tempdir().unwrap();
        // Un directorio ocupa la ruta: el rename final no puede reemplazarlo
        let blocked = dir.path().join("state");
        std::fs::create_dir(&blocked).unwrap();
        let store = StateStore::new(&blocked);
        let session = Arc::new(Mutex::new(Session::new()));

        assert!(!save_shared(&session, &store));
        let saver = AutoSaver::spawn(session, store, Duration::from_secs(3600));
        assert!(!saver.shutdown());
    }
}
