use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for psx-engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, build, test)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Quick checks before commit (fmt, clippy)
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the project
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test {
        #[arg(long)]
        doc: bool,
        #[arg(long)]
        ignored: bool,
        /// Run only the named core modules (cpu, gte, memory, dma, cdrom, ...)
        #[arg(long = "module", short = 'm')]
        modules: Vec<String>,
    },
    /// Regenerate the golden snapshot under tests/golden
    Golden,
    /// Run benchmarks
    Bench,
    /// Boot a real BIOS through the command-line runner
    BiosBoot {
        /// Path to BIOS file (defaults to SCPH1001.BIN)
        #[arg(default_value = "SCPH1001.BIN")]
        bios_path: String,
        /// Number of instructions to execute
        #[arg(short = 'n', long, default_value = "100000")]
        instructions: u64,
        /// Write the final machine state to this JSON file
        #[arg(long)]
        dump_state: Option<String>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
    /// Pre-commit hook (fmt, clippy, test)
    PreCommit,
    /// Install git hooks
    InstallHooks,
}

/// Modules with a `#[cfg(test)]` suite under `src/core`
const CORE_MODULES: &[&str] = &[
    "cdrom",
    "config",
    "cpu",
    "dma",
    "gte",
    "interrupt",
    "memory",
    "scheduler",
    "snapshot",
    "system",
    "video",
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Check { verbose } => run_check(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy { fix } => run_clippy(fix),
        Commands::Build { release } => run_build(release),
        Commands::Test {
            doc,
            ignored,
            modules,
        } => run_test(doc, ignored, &modules),
        Commands::Golden => run_golden(),
        Commands::Bench => run_bench(),
        Commands::BiosBoot {
            bios_path,
            instructions,
            dump_state,
            release,
        } => run_bios_boot(&bios_path, instructions, dump_state.as_deref(), release),
        Commands::PreCommit => run_pre_commit(),
        Commands::InstallHooks => install_hooks(),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;
    run_task("Build", || run_build(false), verbose)?;
    run_task("Test", || run_test(false, false, &[]), verbose)?;
    run_task("Doc Test", || run_test(true, false, &[]), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_check(verbose: bool) -> Result<()> {
    println!("{}", "=== Running Quick Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", || run_clippy(false), verbose)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy(fix: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy").arg("--workspace").arg("--all-targets");

    if fix {
        cmd.arg("--fix");
    } else {
        cmd.arg("--").arg("-D").arg("warnings");
    }

    execute_command(&mut cmd)
}

fn run_build(release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");

    if release {
        cmd.arg("--release");
    }

    execute_command(&mut cmd)
}

fn run_test(doc: bool, ignored: bool, modules: &[String]) -> Result<()> {
    if doc {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--doc");

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    if modules.is_empty() {
        let mut cmd = Command::new("cargo");
        cmd.arg("test");

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        return execute_command(&mut cmd);
    }

    if let Some(unknown) = modules
        .iter()
        .find(|name| !CORE_MODULES.contains(&name.as_str()))
    {
        anyhow::bail!(
            "Unknown module '{}' (expected one of: {})",
            unknown,
            CORE_MODULES.join(", ")
        );
    }

    let mut failed = Vec::new();

    for module in modules {
        println!("{} Running {} tests...", "→".blue(), module.bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test")
            .arg("--lib")
            .arg(format!("core::{}::", module));

        if ignored {
            cmd.arg("--").arg("--ignored");
        }

        match execute_command(&mut cmd) {
            Ok(_) => println!("{} {} tests passed\n", "✓".green(), module),
            Err(_) => {
                println!("{} {} tests failed\n", "✗".red(), module);
                failed.push(module.as_str());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Module tests failed: {}", failed.join(", "))
    }
}

fn run_golden() -> Result<()> {
    println!("{}", "=== Regenerating golden snapshot ===".bold().blue());

    let mut cmd = Command::new("cargo");
    cmd.arg("test")
        .arg("--test")
        .arg("golden")
        .env("UPDATE_GOLDEN", "1");

    execute_command(&mut cmd)?;
    println!(
        "{} Review the diff of {}",
        "✓".green(),
        "tests/golden/synthetic_boot.json".cyan()
    );
    Ok(())
}

fn run_bench() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench");

    execute_command(&mut cmd)
}

fn run_bios_boot(
    bios_path: &str,
    instructions: u64,
    dump_state: Option<&str>,
    release: bool,
) -> Result<()> {
    use std::fs;

    println!("{}", "=== BIOS Boot Test ===".bold().blue());

    let bios = Path::new(bios_path);
    if !bios.exists() {
        println!(
            "{} BIOS file not found: {}",
            "✗".red().bold(),
            bios_path.yellow()
        );
        println!(
            "\n{} Place a BIOS image (e.g. SCPH1001.BIN) in the project root or pass its path.",
            "ℹ".blue()
        );
        anyhow::bail!("BIOS file not found");
    }

    let metadata = fs::metadata(bios)?;
    if metadata.len() != 512 * 1024 {
        println!(
            "{} Invalid BIOS size: {} bytes (expected 524288 bytes)",
            "✗".red().bold(),
            metadata.len()
        );
        anyhow::bail!("Invalid BIOS file size");
    }

    println!("{} BIOS file: {}", "✓".green(), bios_path.cyan());
    println!(
        "{} Instructions: {}",
        "→".blue(),
        instructions.to_string().bold()
    );
    println!(
        "{} Build mode: {}",
        "→".blue(),
        if release {
            "release".green().bold()
        } else {
            "debug".yellow().bold()
        }
    );
    println!();

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("--bin").arg("psx-engine");

    if release {
        cmd.arg("--release");
    }

    cmd.arg("--")
        .arg(bios_path)
        .arg("-n")
        .arg(instructions.to_string());

    if let Some(path) = dump_state {
        cmd.arg("--dump-state").arg(path);
    }

    if let Err(e) = execute_command(&mut cmd) {
        println!("\n{} BIOS boot test failed", "✗".red().bold());
        return Err(e);
    }

    let elapsed = start.elapsed();
    println!(
        "\n{} BIOS boot test completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn run_pre_commit() -> Result<()> {
    println!("{}", "=== Pre-commit Checks ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), false)?;
    run_task("Clippy", || run_clippy(false), false)?;
    run_task("Test", || run_test(false, false, &[]), false)?;

    let elapsed = start.elapsed();
    println!(
        "\n{} {}",
        "✓ Pre-commit checks passed in".green().bold(),
        format!("{:.2}s", elapsed.as_secs_f64()).bold()
    );

    Ok(())
}

fn install_hooks() -> Result<()> {
    use std::fs;

    println!("{}", "Installing git hooks...".bold());

    let hook_content = r#"#!/bin/sh
# Auto-generated by cargo x install-hooks
set -e

echo "Running pre-commit checks..."
cargo x pre-commit
"#;

    let hook_path = ".git/hooks/pre-commit";
    if !Path::new(".git/hooks").is_dir() {
        anyhow::bail!("No .git/hooks directory; run from the repository root");
    }
    fs::write(hook_path, hook_content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(hook_path, perms)?;
    }

    println!("{}", "✓ Git hooks installed".green());
    println!("  Pre-commit hook will run: fmt, clippy, test");

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(_) => {
            let elapsed = start.elapsed();
            println!(
                "{} {}",
                "✓".green().bold(),
                if verbose {
                    format!("({:.2}s)", elapsed.as_secs_f64())
                } else {
                    String::new()
                }
            );
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
