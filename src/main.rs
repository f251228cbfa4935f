use recommender_engine::{render_recommendations, Config, Recommender};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    eprintln!("Usage: {} <user_id> [--config <path>]", program);
}

fn main() {
    // Diagnostics go to stderr; stdout carries only the recommendation
    // lines the upstream web layer parses.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args
        .first()
        .map(String::as_str)
        .unwrap_or("recommender_engine");

    let mut user_id: Option<String> = None;
    let mut config_path = PathBuf::from("config.json");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = PathBuf::from(path),
                    None => {
                        print_usage(program);
                        process::exit(2);
                    }
                }
            }
            arg if user_id.is_none() => user_id = Some(arg.to_string()),
            _ => {
                print_usage(program);
                process::exit(2);
            }
        }
        i += 1;
    }

    let user_id = match user_id {
        Some(id) => id,
        None => {
            print_usage(program);
            process::exit(2);
        }
    };

    if let Err(e) = run(&user_id, &config_path) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(user_id: &str, config_path: &std::path::Path) -> recommender_engine::Result<()> {
    let config = Config::load(config_path)?;
    let recommender = Recommender::open(config)?;
    let recommendations = recommender.recommend(user_id)?;
    print!("{}", render_recommendations(user_id, &recommendations));
    Ok(())
}
