use common::config::AppConfig;
use common::logger::init_logger;
use migration::Migrator;
use std::{env, fs, path::Path, process};

mod runner;

#[tokio::main]
async fn main() {
    let config = AppConfig::global();
    if let Err(e) = init_logger(&config.log_level, &config.log_file, config.log_to_stdout) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let db_path = config.database_path.clone();
    let url = if db_path.starts_with("sqlite:") {
        db_path.clone()
    } else {
        format!("sqlite://{}?mode=rwc", db_path)
    };
    let args: Vec<String> = env::args().collect();

    let outcome = match args.get(1).map(|s| s.as_str()) {
        Some("clean") => {
            remove_db_file(&db_path);
            Ok(())
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await
        }
        _ => {
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await
        }
    };

    if let Err(e) = outcome {
        eprintln!("Migration failed: {e}");
        process::exit(1);
    }
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if db_path.exists() {
        match fs::remove_file(db_path) {
            Ok(()) => println!("Deleted DB: {}", db_path.display()),
            Err(e) => {
                eprintln!("Failed to delete DB {}: {}", db_path.display(), e);
                process::exit(1);
            }
        }
    } else {
        println!("DB file does not exist: {}", db_path.display());
    }
}

fn create_db_dir(path: &str) {
    if path.starts_with("sqlite:") {
        return;
    }
    if let Some(parent) = Path::new(path).parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create DB directory: {e}");
            process::exit(1);
        }
    }
}
