use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub initial_soc: Option<Vec<f64>>,
    pub trajectory_out: Option<PathBuf>,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut scenario = None;
    let mut preset = None;
    let mut initial_soc = None;
    let mut trajectory_out = None;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --scenario (expected a TOML file path)",
                )?;
                if scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--initial-soc" => {
                i += 1;
                let raw = args.next_or_err(
                    i,
                    "missing value for --initial-soc (expected comma-separated fractions)",
                )?;
                if initial_soc.replace(parse_soc_list(raw)?).is_some() {
                    return Err("--initial-soc provided more than once".to_string());
                }
            }
            "--trajectory-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --trajectory-out (expected a file path)",
                )?;
                if trajectory_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--trajectory-out provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if scenario.is_some() && preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if scenario.is_none() && preset.is_none() {
        preset = Some("baseline".to_string());
    }

    Ok(CliOptions {
        scenario,
        preset,
        initial_soc,
        trajectory_out,
    })
}

fn parse_soc_list(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(|s| {
            let s = s.trim();
            s.parse::<f64>()
                .map_err(|_| format!("invalid value for --initial-soc: \"{s}\" is not a number"))
        })
        .collect()
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("ev-mpc: optimal EV fleet charging schedule over a fixed horizon");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  ev-mpc [--scenario <path> | --preset <name>]");
    eprintln!("         [--initial-soc <a,b,..>] [--trajectory-out <path>]");
    eprintln!();
    eprintln!("Presets: baseline (default), early_departure, two_day");
    eprintln!("Set RUST_LOG=debug for solver diagnostics.");
}
