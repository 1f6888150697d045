use clap::Parser;
use colored::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vfsim_lib::types::DEFAULT_STATE_FILE;
use vfsim_lib::autosave::save_shared;
use vfsim_lib::{AutoSaver, Session, StateStore};

mod shell;

use shell::{Flow, Shell};

/// Consola interactiva sobre el sistema de archivos simulado
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Archivo JSON con el estado
    #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Segundos entre autoguardados (0 lo desactiva)
    #[arg(long, default_value_t = 300)]
    autosave_secs: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init(); // Para ver logs con RUST_LOG=debug
    let args = Args::parse();

    let store = StateStore::new(&args.state);
    let session = Arc::new(Mutex::new(Session::load_or_default(&store)));

    let saver = (args.autosave_secs > 0).then(|| {
        AutoSaver::spawn(session.clone(), store.clone(), Duration::from_secs(args.autosave_secs))
    });

    println!("VFSim sobre {:?}. Escriba 'help' para ver los comandos.", args.state);
    let mut shell = Shell::new(session.clone(), store.clone());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", shell.prompt());
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        if let Flow::Exit = shell.execute(&line?) {
            break;
        }
    }

    // El guardado final lo hace el hilo de autoguardado al detenerse
    let saved = match saver {
        Some(saver) => saver.shutdown(),
        None => save_shared(&session, &store),
    };
    if saved {
        println!("Estado guardado en {:?}", args.state);
    } else {
        println!("{} no se pudo guardar el estado en {:?}", "Error:".red(), args.state);
    }
    Ok(())
}
