//! RAX File Manager - Entry Point
//!
//! Runs one sandboxed filesystem action, prints a directory tree, or reports
//! consumed space for the configured root.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

use rax_filemanager::{ActionKind, ActionRequest, EngineConfig, EntryKind, FileManager, UploadedFile};

#[derive(Parser, Debug)]
#[command(name = "rax-filemanager", about = "Sandboxed file manager actions")]
struct Args {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one action: upload, add, delete, rename, move, copy or unzip
    Action {
        action: String,
        /// Target path relative to the root
        #[arg(long, default_value = "/")]
        path: String,
        /// New folder or file name
        #[arg(long)]
        name: Option<String>,
        /// file or dir
        #[arg(long, default_value = "file")]
        kind: String,
        /// Directory currently shown; destination for move, copy and unzip
        #[arg(long, default_value = "/")]
        current_path: String,
        /// Local files to upload
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Print the directory tree as JSON
    Tree {
        #[arg(long, default_value = "/")]
        current_path: String,
    },
    /// Print the bytes used under the root
    Space,
}

fn fail(message: String) -> ! {
    error!("{}", message);
    eprintln!("{}", message);
    process::exit(1);
}

fn open_upload(path: &Path) -> Result<UploadedFile, String> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("Not a file: {}", path.display()))?;
    let file = File::open(path).map_err(|e| format!("Cannot open {}: {}", path.display(), e))?;
    let size = file
        .metadata()
        .map_err(|e| format!("Cannot stat {}: {}", path.display(), e))?
        .len();
    Ok(UploadedFile::from_reader(name, size, file))
}

fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let args = Args::parse();

    let config = EngineConfig::load(args.config.as_deref())
        .unwrap_or_else(|e| fail(format!("Failed to load configuration: {}", e)));
    let manager = FileManager::new(config).unwrap_or_else(|e| fail(e.to_string()));

    match args.command {
        Command::Action {
            action,
            path,
            name,
            kind,
            current_path,
            files,
        } => {
            let action: ActionKind = action.parse().unwrap_or_else(|e| fail(format!("{}", e)));
            let kind: EntryKind = kind.parse().unwrap_or_else(|e| fail(format!("{}", e)));

            let mut request = ActionRequest::new(action, path)
                .with_kind(kind)
                .with_current_path(current_path);
            request.name = name;
            for file in &files {
                request = request.with_file(open_upload(file).unwrap_or_else(|e| fail(e)));
            }

            info!("Running {} action", action);
            for message in manager.handle(request) {
                println!("{}", message);
            }
        }
        Command::Tree { current_path } => {
            let tree = manager
                .directory_structure(&current_path)
                .unwrap_or_else(|e| fail(format!("Failed to read directory tree: {}", e)));
            match serde_json::to_string_pretty(&tree) {
                Ok(json) => println!("{}", json),
                Err(e) => fail(format!("Failed to serialize directory tree: {}", e)),
            }
        }
        Command::Space => {
            let used = manager
                .space_consumed()
                .unwrap_or_else(|e| fail(e.to_string()));
            let config = manager.config();
            println!("{} bytes used of {} KB", used, config.max_space_kb);
        }
    }
}
