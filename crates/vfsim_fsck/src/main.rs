use clap::Parser;
use colored::*; // Para output bonito
use std::path::PathBuf;

use vfsim_lib::audit::{Severity, audit};
use vfsim_lib::store::StateStore;
use vfsim_lib::types::DEFAULT_STATE_FILE;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Archivo de estado a revisar
    #[arg(value_name = "STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("{}", "=== VFSim File System Check (fsck) ===".bold().blue());

    // 1. Leer el estado
    let store = StateStore::new(&args.path);
    let record = match store.load() {
        Ok(Some(record)) => record,
        Ok(None) => anyhow::bail!("{:?} no existe", args.path),
        Err(e) => {
            println!("{} {}", "[FAIL] Estado ilegible:".red(), e);
            return Ok(());
        }
    };
    println!("{}", "[OK] JSON válido".green());

    // 2. Auditar
    println!("[*] Recorriendo el bosque...");
    let report = audit(&record);
    println!("    > Directorios: {}", report.directories);
    println!("    > Archivos: {}", report.files);
    let users = record.user_list.as_ref().map_or(0, Vec::len);
    println!("    > Usuarios: {} (actual: {})", users, record.current_user.username);

    println!("[*] Buscando inconsistencias...");
    for finding in &report.findings {
        let tag = match finding.severity {
            Severity::Error => "[ERROR]".red(),
            Severity::Warning => "[WARN]".yellow(),
        };
        println!("    {} {}", tag, finding);
    }

    if report.errors() == 0 {
        println!("\n{}", ">> EL SISTEMA DE ARCHIVOS ESTÁ SANO".bold().green());
        if report.warnings() > 0 {
            println!("   ({} avisos)", report.warnings());
        }
    } else {
        println!("\n{} Se encontraron {} errores graves.", ">> PRECAUCIÓN:".bold().red(), report.errors());
    }

    Ok(())
}
