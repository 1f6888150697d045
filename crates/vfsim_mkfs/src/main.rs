use clap::Parser;
use std::path::PathBuf;

use vfsim_lib::Session;
use vfsim_lib::store::StateStore;
use vfsim_lib::types::DEFAULT_STATE_FILE;

/// Crea un archivo de estado nuevo con el bosque por defecto
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Archivo JSON donde se guardará el estado
    #[arg(value_name = "STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    path: PathBuf,

    /// Nombre del usuario ADMIN inicial
    #[arg(short, long, default_value = "admin")]
    admin: String,

    /// Sobrescribir el archivo si ya existe
    #[arg(short, long)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    println!("=== Formateador VFSim ===");
    println!("Archivo objetivo: {:?}", args.path);

    let store = StateStore::new(&args.path);
    if store.exists() && !args.force {
        anyhow::bail!("{:?} ya existe. Use --force para sobrescribirlo.", args.path);
    }

    let session = Session::with_admin(&args.admin)?;
    session.save(&store)?;

    for root in session.roots() {
        println!("[x] Raíz '{}' creada", root.name());
    }
    println!("[x] Usuario inicial: {} ({})", session.current_user().username, session.current_user().role);
    println!("¡Estado creado exitosamente!");
    Ok(())
}
