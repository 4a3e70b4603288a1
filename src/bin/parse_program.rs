//! Program Requirement Parser
//!
//! Parses a text file of insurance program requirements and prints the
//! result as JSON.
//!
//! Usage:
//!   cargo run --bin parse_program -- requirements.txt
//!   cargo run --bin parse_program -- requirements.txt --schedule schedule.json
//!   cargo run --bin parse_program -- requirements.txt --max-bytes 65536 --truncate
//!   cargo run --bin parse_program -- requirements.txt --placeholder --compact
//!   cargo run --bin parse_program -- --validate

use coi_program_parser::validation::run_validation;
use coi_program_parser::{LimitSchedule, OversizePolicy, ParserOptions, ProgramParser};
use std::fs;
use std::path::PathBuf;
use std::process;

struct CliConfig {
    input: Option<PathBuf>,
    schedule: Option<PathBuf>,
    max_bytes: Option<usize>,
    truncate: bool,
    placeholder: bool,
    compact: bool,
    validate: bool,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            input: None,
            schedule: None,
            max_bytes: None,
            truncate: false,
            placeholder: false,
            compact: false,
            validate: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--schedule" => {
                    i += 1;
                    let path = args.get(i).ok_or("--schedule needs a path")?;
                    config.schedule = Some(PathBuf::from(path));
                },
                "--max-bytes" => {
                    i += 1;
                    let value = args.get(i).ok_or("--max-bytes needs a number")?;
                    let max = value
                        .parse()
                        .map_err(|_| format!("invalid --max-bytes value '{}'", value))?;
                    config.max_bytes = Some(max);
                },
                "--truncate" => config.truncate = true,
                "--placeholder" => config.placeholder = true,
                "--compact" => config.compact = true,
                "--validate" => config.validate = true,
                "--help" | "-h" => return Err(usage()),
                other if other.starts_with("--") => return Err(format!("unknown option '{}'\n{}", other, usage())),
                other => config.input = Some(PathBuf::from(other)),
            }
            i += 1;
        }

        if config.input.is_none() && !config.validate {
            return Err(usage());
        }
        Ok(config)
    }

    fn options(&self) -> Result<ParserOptions, String> {
        let mut options = ParserOptions::default().with_placeholder(self.placeholder);
        if let Some(max) = self.max_bytes {
            options = options.with_max_input_bytes(max);
        }
        if self.truncate {
            options = options.with_oversize(OversizePolicy::Truncate);
        }
        if let Some(path) = &self.schedule {
            let schedule = LimitSchedule::from_path(path)
                .map_err(|e| format!("failed to load schedule {}: {}", path.display(), e))?;
            options = options.with_schedule(schedule);
        }
        Ok(options)
    }
}

fn usage() -> String {
    "usage: parse_program <text-file> [--schedule <json>] [--max-bytes N] [--truncate] [--placeholder] [--compact]\n       parse_program --validate"
        .to_string()
}

fn run(config: &CliConfig) -> Result<i32, String> {
    let parser = ProgramParser::with_options(config.options()?);

    if config.validate {
        let report = run_validation(&parser);
        println!("{}", report);
        return Ok(if report.is_success() { 0 } else { 1 });
    }

    let Some(input) = &config.input else {
        return Err(usage());
    };
    let text = fs::read_to_string(input).map_err(|e| format!("failed to read {}: {}", input.display(), e))?;
    let program = parser.parse(&text).map_err(|e| e.to_string())?;

    let json = if config.compact {
        program.to_json()
    } else {
        program.to_json_pretty()
    }
    .map_err(|e| e.to_string())?;
    println!("{}", json);

    if program.requires_manual_review() {
        log::warn!(
            "{}: manual review required ({} low-confidence rows)",
            input.display(),
            program.low_confidence_rows().count()
        );
    }
    Ok(0)
}

fn main() {
    env_logger::init();

    let code = match CliConfig::from_args().and_then(|config| run(&config)) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{}", message);
            2
        },
    };
    process::exit(code);
}
