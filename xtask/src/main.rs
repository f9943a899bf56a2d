use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const CORE_PACKAGE: &str = "coreport-core";
const BIN_PACKAGE: &str = "coreport-bin";
const BINARY: &str = "coreport";

fn main() -> Result<()> {
    let args = clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install coreport binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run coreport with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(clap::Arg::new("args")
                    .help("Arguments to pass to coreport")
                    .action(clap::ArgAction::Append)
                    .num_args(0..))
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run every test suite and CLI smoke check"))
                .subcommand(Command::new("core").about("Run tests for coreport-core"))
                .subcommand(Command::new("bin").about("Run tests for coreport-bin"))
        )
        .get_matches();

    match args.subcommand() {
        Some(("install", _args)) => install(),
        Some(("run", args)) => run(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{}", failure);
    }
    Ok(())
}

fn install() -> Result<()> {
    println!("Installing {BINARY}...");
    cargo(&["install", "--path", "crates/coreport-bin"], "Failed to install coreport")?;
    println!("✓ {BINARY} installed successfully");
    Ok(())
}

fn run(args: &ArgMatches) -> Result<()> {
    let run_args: Vec<&str> = args
        .get_many::<String>("args")
        .map_or(Vec::new(), |vals| vals.map(String::as_str).collect());

    let mut cargo_args = vec!["run", "--bin", BINARY, "--"];
    cargo_args.extend(run_args);
    cargo(&cargo_args, "Failed to run coreport")
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _args)) => test_all(),
        Some(("core", _args)) => cargo(&["test", "--package", CORE_PACKAGE], "Core tests failed"),
        Some(("bin", _args)) => cargo(&["test", "--package", BIN_PACKAGE], "Binary tests failed"),
        _ => {
            println!("Available test commands:");
            println!("  all   - Run every test suite and CLI smoke check");
            println!("  core  - Run tests for {CORE_PACKAGE}");
            println!("  bin   - Run tests for {BIN_PACKAGE}");
            Ok(())
        }
    }
}

fn test_all() -> Result<()> {
    let suites: [(&str, &[&str]); 4] = [
        ("workspace tests", &["test", "--workspace"]),
        ("documentation tests", &["test", "--doc", "--package", CORE_PACKAGE]),
        ("CLI help", &["run", "--bin", BINARY, "--", "--help"]),
        ("CLI rename help", &["run", "--bin", BINARY, "--", "rename", "--help"]),
    ];

    let mut failed = Vec::new();
    for (name, args) in suites {
        println!("🧪 Running {name}...");
        match cargo(args, name) {
            Ok(()) => println!("✅ {name} passed\n"),
            Err(err) => {
                println!("❌ {name} failed: {err}\n");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Test suite failed: {}", failed.join(", "));
    }
    println!("🎉 All tests passed successfully!");
    Ok(())
}
