use crossterm::style::Stylize;
use data_sweeper::config::Config;
use data_sweeper::data::cleaning::CleaningOp;
use data_sweeper::data::file_format::FileFormat;
use data_sweeper::session;
use std::path::PathBuf;

fn print_help() {
    println!("{}", "data-sweeper - clean and convert tabular files".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  data-sweeper [OPTIONS] FILE.csv [FILE.xlsx ...]");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {}   - Convert files without the UI",
        "--convert csv|xlsx".green()
    );
    println!(
        "  {}            - With --convert: remove duplicate rows",
        "--dedup".green()
    );
    println!(
        "  {}     - With --convert: mean-fill missing numerics",
        "--fill-missing".green()
    );
    println!(
        "  {}  - Write a commented default config and exit",
        "--generate-config".green()
    );
    println!("  {}             - Show this help", "--help".green());
    println!();
    println!("{}", "Interactive keys:".yellow());
    println!("  {} - switch file, {} - dedup, {} - fill missing", "Tab".green(), "d".green(), "f".green());
    println!("  {} - toggle column, {} - chart, {} - format, {} - export", "space".green(), "v".green(), "t".green(), "e".green());
    println!();
}

fn main() -> anyhow::Result<()> {
    data_sweeper::utils::logging::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.contains(&"--help".to_string()) || args.contains(&"-h".to_string()) {
        print_help();
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        let path = Config::get_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, Config::create_default_with_comments())?;
        println!("Configuration file created at: {:?}", path);
        println!("Edit this file to customize data-sweeper.");
        return Ok(());
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error ({}), using defaults", e);
            Config::default()
        }
    };

    let convert_pos = args.iter().position(|arg| arg == "--convert");
    let convert_format = convert_pos
        .and_then(|pos| args.get(pos + 1))
        .map(|s| s.to_ascii_lowercase());

    // Everything that is not a flag (or the --convert value) is an input file
    let files: Vec<String> = args
        .iter()
        .enumerate()
        .filter(|(idx, arg)| {
            !arg.starts_with("--") && convert_pos.map_or(true, |pos| *idx != pos + 1)
        })
        .map(|(_, arg)| arg.clone())
        .collect();

    if let Some(format_name) = convert_format {
        let format = match format_name.as_str() {
            "csv" => FileFormat::Csv,
            "xlsx" => FileFormat::Xlsx,
            other => {
                eprintln!("{}", format!("Unknown target format: {}", other).red());
                std::process::exit(1);
            }
        };

        let mut ops = Vec::new();
        if args.contains(&"--dedup".to_string()) {
            ops.push(CleaningOp::RemoveDuplicates);
        }
        if args.contains(&"--fill-missing".to_string()) {
            ops.push(CleaningOp::FillMissingNumeric);
        }

        return run_headless(&files, format, &ops, &config);
    }

    if files.is_empty() {
        print_help();
        eprintln!("{}", "No input files given.".red());
        return Ok(());
    }

    data_sweeper::ui::run_tui(&files, config)
}

/// Scriptable twin of the UI flow: load, clean, export every valid file.
fn run_headless(
    files: &[String],
    format: FileFormat,
    ops: &[CleaningOp],
    config: &Config,
) -> anyhow::Result<()> {
    let (mut sessions, errors) = session::load_sessions(files);
    for error in &errors {
        eprintln!("{}", error.clone().red());
    }

    let output_dir = config
        .behavior
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut failed = false;
    for session in &mut sessions {
        session.ops = ops.to_vec();
        session.export_format = format;

        match session
            .export()
            .and_then(|artifact| artifact.save_to_dir(&output_dir))
        {
            Ok(path) => {
                println!(
                    "{}",
                    format!(
                        "Converted {} -> {}",
                        session.file_name,
                        path.display()
                    )
                    .green()
                );
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    format!("Failed to convert {}: {}", session.file_name, e).red()
                );
                failed = true;
            }
        }
    }

    if failed || (!errors.is_empty() && sessions.is_empty()) {
        std::process::exit(1);
    }

    println!("All files processed.");
    Ok(())
}
