use anyhow::{Context, bail};
use colored::*;
use std::sync::{Arc, Mutex, MutexGuard};

use vfsim_lib::clipboard::ClipOp;
use vfsim_lib::view::{FileView, listing_line};
use vfsim_lib::{BatchReport, EntryId, EntryRef, Permission, Role, Session, StateStore, format_size};

const HELP: &str = "\
Navegación:   ls | cd <dir> | cd .. | cd / | pwd | trash
Archivos:     touch <nombre> [--ro] | write <nombre> <texto> | append <nombre> <texto>
              cat <nombre> | stat <nombre> | chmod <nombre> ro|rw
Directorios:  mkdir <nombre> | mv <viejo> <nuevo> | find <dir> | search <texto>
Borrado:      rm <nombres..> | restore <nombres..> | purge <nombres..> | empty-trash
Portapapeles: cut <nombres..> | copy <nombres..> | paste | clip
Usuarios:     whoami | users | su <usuario> | useradd <usuario> [admin]
Estado:       save | exit";

pub enum Flow {
    Continue,
    Exit,
}

/// Estado de la consola: la sesión compartida con el autoguardado y la
/// ruta actual como cadena de IDs desde una raíz.
pub struct Shell {
    session: Arc<Mutex<Session>>,
    store: StateStore,
    path: Vec<EntryId>,
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Shell {
    pub fn new(session: Arc<Mutex<Session>>, store: StateStore) -> Self {
        Self { session, store, path: Vec::new() }
    }

    pub fn prompt(&self) -> String {
        let session = lock(&self.session);
        format!("{}@vfsim:{}> ", session.current_user().username, self.path_string(&session))
    }

    pub fn execute(&mut self, line: &str) -> Flow {
        let shared = Arc::clone(&self.session);
        let mut session = lock(&shared);

        let (cmd, rest) = line.trim().split_once(char::is_whitespace).unwrap_or((line.trim(), ""));
        let flow = match self.run(&mut session, cmd, rest.trim()) {
            Ok(flow) => flow,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                Flow::Continue
            }
        };
        self.sync_path(&session);
        flow
    }

    fn run(&mut self, session: &mut Session, cmd: &str, rest: &str) -> anyhow::Result<Flow> {
        let args: Vec<&str> = rest.split_whitespace().collect();
        match cmd {
            "" => {}
            "help" => println!("{}", HELP),
            "exit" | "quit" => return Ok(Flow::Exit),
            "pwd" => println!("{}", self.path_string(session)),
            "ls" => self.list(session),
            "cd" => self.change_dir(session, one(&args)?)?,
            "trash" => self.path = vec![session.trash_id()],

            "mkdir" => {
                let name = one(&args)?;
                match self.cwd() {
                    Some(dir) => session.create_subdirectory(dir, name)?,
                    None => session.create_root_directory(name)?,
                };
            }
            "touch" => {
                let name = args.first().context("falta el nombre")?;
                let perm = if args.contains(&"--ro") { Permission::ReadOnly } else { Permission::ReadWrite };
                session.create_file(self.dir()?, name, perm)?;
            }
            "write" | "append" => {
                let (name, text) = rest.split_once(' ').unwrap_or((rest, ""));
                if name.is_empty() {
                    bail!("uso: {} <nombre> <texto>", cmd);
                }
                let text = text.replace("\\n", "\n");
                if cmd == "write" {
                    session.write_file(self.dir()?, name, &text)?;
                } else {
                    session.append_file(self.dir()?, name, &text)?;
                }
            }
            "cat" => println!("{}", session.read_file(self.dir()?, one(&args)?)?.content()),
            "stat" => {
                let dir = self.dir()?;
                let file = session.read_file(dir, one(&args)?)?;
                let location = session.directory(dir).map_or("?", |d| d.name());
                println!("{}", FileView::new(file, location));
            }
            "chmod" => {
                let [name, mode] = args[..] else { bail!("uso: chmod <nombre> ro|rw") };
                let perm = match mode {
                    "ro" => Permission::ReadOnly,
                    "rw" => Permission::ReadWrite,
                    other => bail!("permiso desconocido: {}", other),
                };
                session.set_permissions(self.dir()?, name, perm)?;
            }
            "mv" => {
                let [old, new] = args[..] else { bail!("uso: mv <viejo> <nuevo>") };
                match self.cwd() {
                    None => session.rename_root_directory(old, new)?,
                    Some(dir) if session.read_file(dir, old).is_ok() => session.rename_file(dir, old, new)?,
                    Some(dir) => session.rename_subdirectory(dir, old, new)?,
                }
            }

            "rm" => match self.cwd() {
                None => {
                    for name in at_least_one(&args)? {
                        match session.delete_root_directory(name) {
                            Ok(()) => println!("  {} {}", "✓".green(), name),
                            Err(e) => println!("  {} {}: {}", "✗".red(), name, e),
                        }
                    }
                }
                Some(dir) => print_report(&session.delete_items(dir, at_least_one(&args)?)?),
            },
            "restore" => print_report(&session.restore_items(self.dir()?, at_least_one(&args)?)?),
            "purge" => print_report(&session.delete_items_permanently(self.dir()?, at_least_one(&args)?)?),
            "empty-trash" => println!("{} entradas eliminadas", session.empty_trash()),

            "cut" | "copy" => {
                let dir = self.dir()?;
                let names = at_least_one(&args)?;
                let items = session.directory(dir).map(|d| d.select(names)).unwrap_or_default();
                if items.is_empty() {
                    bail!("ninguno de los nombres existe aquí");
                }
                let op = if cmd == "cut" { ClipOp::Cut } else { ClipOp::Copy };
                println!("{} elementos en el portapapeles", items.len());
                session.copy_to_clipboard(items, op, dir);
            }
            "paste" => {
                let target = self.cwd();
                session.check_paste(target)?;
                let pasted = session.paste(self.dir()?)?;
                println!("{} elementos pegados", pasted);
            }
            "clip" => show_clipboard(session),

            "whoami" => {
                let user = session.current_user();
                println!("{} ({})", user.username, user.role);
            }
            "users" => {
                for user in session.users() {
                    let mark = if user.username == session.current_user().username { "*" } else { " " };
                    println!("{} {} ({})", mark, user.username, user.role);
                }
            }
            "su" => session.switch_user(one(&args)?)?,
            "useradd" => {
                let name = args.first().context("falta el nombre de usuario")?;
                let role = match args.get(1) {
                    Some(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
                    Some(r) if r.eq_ignore_ascii_case("user") => Role::User,
                    Some(other) => bail!("rol desconocido: {}", other),
                    None => Role::User,
                };
                session.add_user(name, role)?;
            }

            "find" => {
                let name = one(&args)?;
                let dir = session.find_directory(name).with_context(|| format!("'{}' no existe", name))?;
                println!(
                    "{}: {} archivos, {} subdirectorios, {}",
                    dir.name().blue(),
                    dir.files().len(),
                    dir.subdirectories().len(),
                    format_size(dir.total_size())
                );
            }
            "search" => {
                let dir = session.directory(self.dir()?).context("directorio actual perdido")?;
                for entry in dir.search(rest) {
                    println!("{}", listing_line(&entry));
                }
            }
            "save" => {
                session.save(&self.store)?;
                println!("Estado guardado en {:?}", self.store.path());
            }
            other => bail!("comando desconocido: {} (pruebe 'help')", other),
        }
        Ok(Flow::Continue)
    }

    fn cwd(&self) -> Option<EntryId> {
        self.path.last().copied()
    }

    fn dir(&self) -> anyhow::Result<EntryId> {
        self.cwd().context("en el nivel raíz; use 'cd <raíz>' primero")
    }

    fn list(&self, session: &Session) {
        match self.cwd().and_then(|id| session.directory(id)) {
            None => {
                for root in session.roots() {
                    println!("[D] {}", root.name().blue());
                }
            }
            Some(dir) => {
                for entry in dir.entries() {
                    println!("{}", listing_line(&entry));
                }
            }
        }
    }

    fn change_dir(&mut self, session: &Session, target: &str) -> anyhow::Result<()> {
        match target {
            "/" => self.path.clear(),
            ".." => {
                self.path.pop();
            }
            name => {
                let next = match self.cwd().and_then(|id| session.directory(id)) {
                    None => session.root(name),
                    Some(dir) => dir.subdirectory(name),
                };
                let next = next.with_context(|| format!("'{}' no existe aquí", name))?;
                self.path.push(next.id());
            }
        }
        Ok(())
    }

    fn path_string(&self, session: &Session) -> String {
        let names: Vec<&str> = self
            .path
            .iter()
            .filter_map(|id| session.directory(*id))
            .map(|d| d.name())
            .collect();
        format!("/{}", names.join("/"))
    }

    /// Recorta la ruta en el primer tramo que ya no existe (borrado o movido).
    fn sync_path(&mut self, session: &Session) {
        let mut valid = 0;
        for (i, id) in self.path.iter().enumerate() {
            let linked = match i {
                0 => session.roots().any(|r| r.id() == *id),
                _ => session
                    .directory(self.path[i - 1])
                    .is_some_and(|parent| parent.subdirectories().iter().any(|d| d.id() == *id)),
            };
            if !linked {
                break;
            }
            valid += 1;
        }
        self.path.truncate(valid);
    }
}

fn one<'a>(args: &[&'a str]) -> anyhow::Result<&'a str> {
    match args {
        [name] => Ok(*name),
        _ => bail!("se esperaba exactamente un argumento"),
    }
}

fn at_least_one<'a, 'b>(args: &'b [&'a str]) -> anyhow::Result<&'b [&'a str]> {
    if args.is_empty() {
        bail!("falta al menos un nombre");
    }
    Ok(args)
}

fn print_report(report: &BatchReport) {
    for name in &report.succeeded {
        println!("  {} {}", "✓".green(), name);
    }
    for (name, err) in &report.failed {
        println!("  {} {}: {}", "✗".red(), name, err);
    }
}

fn show_clipboard(session: &Session) {
    let Some(clip) = session.clipboard() else {
        println!("Portapapeles vacío");
        return;
    };
    let op = match clip.op {
        ClipOp::Cut => "cortar",
        ClipOp::Copy => "copiar",
    };
    println!("Operación: {}", op);
    for item in &clip.items {
        match *item {
            EntryRef::File(id) => match session.find_file(id) {
                Some(file) => println!("  [F] {}", file.name()),
                None => println!("  [F] (ya no existe)"),
            },
            EntryRef::Directory(id) => match session.directory(id) {
                Some(dir) => println!("  [D] {}", dir.name()),
                None => println!("  [D] (ya no existe)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> Shell {
        let store = StateStore::new(std::env::temp_dir().join("vfsim_shell_test_unused.json"));
        Shell::new(Arc::new(Mutex::new(Session::new())), store)
    }

    fn run(shell: &mut Shell, lines: &[&str]) {
        for line in lines {
            shell.execute(line);
        }
    }

    #[test]
    fn test_navigation_and_files() {
        let mut sh = shell();
        run(&mut sh, &["cd Documents", "mkdir Reports", "cd Reports", "touch a.txt", "write a.txt hola mundo"]);
        assert_eq!(sh.prompt(), "admin@vfsim:/Documents/Reports> ");

        let session = lock(&sh.session);
        let reports = session.find_directory("Reports").unwrap();
        assert_eq!(reports.file("a.txt").unwrap().content(), "hola mundo");
    }

    #[test]
    fn test_path_is_trimmed_after_delete() {
        let mut sh = shell();
        run(&mut sh, &["cd Documents", "mkdir Old", "cd Old"]);
        {
            let mut session = lock(&sh.session);
            let docs = session.root("Documents").unwrap().id();
            session.delete_subdirectory(docs, "Old").unwrap();
        }
        run(&mut sh, &["pwd"]);
        assert_eq!(sh.prompt(), "admin@vfsim:/Documents> ");

        run(&mut sh, &["trash", "cd Old"]);
        assert_eq!(sh.prompt(), "admin@vfsim:/Trash/Old> ");
        run(&mut sh, &["cd ..", "purge Old"]);
        assert_eq!(sh.prompt(), "admin@vfsim:/Trash> ");
    }

    #[test]
    fn test_cut_and_paste() {
        let mut sh = shell();
        run(&mut sh, &["cd Documents", "touch a.txt", "cut a.txt", "cd /", "cd Media", "paste"]);
        let session = lock(&sh.session);
        assert!(session.root("Media").unwrap().has_file("a.txt"));
        assert!(!session.root("Documents").unwrap().has_file("a.txt"));
        assert!(session.clipboard().is_none());
    }

    #[test]
    fn test_exit() {
        let mut sh = shell();
        assert!(matches!(sh.execute("exit"), Flow::Exit));
        assert!(matches!(sh.execute("nonsense"), Flow::Continue));
    }
}
