use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;

use soltest_script::ast::lookup::{discover_tests, find_function_in, TestCase};
use soltest_script::ast::printer::{self, Node};
use soltest_script::ast::span::line_at;
use soltest_script::config::Config;
use soltest_script::runtime::harness::{HarnessCall, RecordingHarness};
use soltest_script::runtime::{Executor, TestContext};
use soltest_script::source::{load_unit, LoadedUnit};

#[derive(ClapParser)]
#[command(name = "soltest", version, about = "Run Solidity test functions from a solc AST")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log call dispatch at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute test functions
    Run {
        /// solc compact-JSON AST
        #[arg(long)]
        ast: PathBuf,
        /// Solidity source the AST was compiled from
        #[arg(long)]
        source: Option<PathBuf>,
        /// Contract whose tests to run (defaults to every contract)
        #[arg(short, long)]
        contract: Option<String>,
        /// Test function to run; repeatable (defaults to discovered tests)
        #[arg(short, long)]
        test: Vec<String>,
        /// Line reported as the test's location
        #[arg(long)]
        line: Option<usize>,
        /// Only accept these harness members; repeatable
        #[arg(long = "allow")]
        allow: Vec<String>,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },
    /// List discovered test functions
    List {
        /// solc compact-JSON AST
        #[arg(long)]
        ast: PathBuf,
    },
    /// Pretty-print a function's AST
    Dump {
        /// solc compact-JSON AST
        #[arg(long)]
        ast: PathBuf,
        /// Function name
        function: String,
        #[arg(short, long)]
        contract: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let exit_code = match cli.command {
        Commands::Run {
            ast,
            source,
            contract,
            test,
            line,
            allow,
            json,
        } => cmd_run(
            &config,
            &ast,
            source.as_deref(),
            RunOptions {
                contract,
                tests: test,
                line,
                allow,
                json,
            },
        ),
        Commands::List { ast } => cmd_list(&config, &ast),
        Commands::Dump {
            ast,
            function,
            contract,
        } => cmd_dump(&config, &ast, &function, contract.as_deref()),
    };
    process::exit(exit_code);
}

/// Logging is off unless `RUST_LOG` is set or `--verbose` is passed.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load(config: &Config, ast: &Path, source: Option<&Path>) -> Result<LoadedUnit, i32> {
    load_unit(ast, source, config.max_source_size).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })
}

// ── run ─────────────────────────────────────────────────────────────────

struct RunOptions {
    contract: Option<String>,
    tests: Vec<String>,
    line: Option<usize>,
    allow: Vec<String>,
    json: bool,
}

#[derive(Serialize)]
struct TestReport {
    contract: String,
    test: String,
    success: bool,
    message: String,
    calls: Vec<HarnessCall>,
}

fn cmd_run(config: &Config, ast: &Path, source: Option<&Path>, opts: RunOptions) -> i32 {
    let loaded = match load(config, ast, source) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let cases = match select_tests(config, &loaded, &opts) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if cases.is_empty() {
        eprintln!("Error: no test functions found");
        return 1;
    }

    let allowed: Vec<&str> = opts.allow.iter().map(String::as_str).collect();
    let identity = config.identity();
    let mut reports = Vec::new();

    for case in &cases {
        let contract = case.contract.clone().unwrap_or_default();
        let line = opts
            .line
            .unwrap_or_else(|| declaration_line(&loaded, &contract, &case.name));
        let mut harness = if allowed.is_empty() {
            RecordingHarness::new()
        } else {
            RecordingHarness::with_methods(&allowed)
        };

        let context = TestContext::new(&loaded.unit, &loaded.source, &contract, &loaded.file, line);
        let outcome = Executor::new(context, &mut harness)
            .with_identity(identity.clone())
            .execute(&case.name);

        // A test that cannot be found reports failure with no message.
        let message = if !outcome.success && outcome.message.is_empty() {
            format!("test function '{}' not found", case.name)
        } else {
            outcome.message
        };
        reports.push(TestReport {
            contract,
            test: case.name.clone(),
            success: outcome.success,
            message,
            calls: harness.take_calls(),
        });
    }

    let failed = reports.iter().filter(|r| !r.success).count();
    if opts.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        print_reports(&reports, &config.harness_name);
        println!();
        println!("{} passed, {} failed", reports.len() - failed, failed);
    }

    if failed > 0 {
        1
    } else {
        0
    }
}

fn select_tests(config: &Config, loaded: &LoadedUnit, opts: &RunOptions) -> Result<Vec<TestCase>, i32> {
    if !opts.tests.is_empty() {
        return Ok(opts
            .tests
            .iter()
            .map(|name| TestCase {
                contract: opts.contract.clone(),
                name: name.clone(),
            })
            .collect());
    }

    let pattern = config.test_regex().map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })?;
    let mut cases = discover_tests(&loaded.unit, &pattern);
    if let Some(contract) = &opts.contract {
        cases.retain(|c| c.contract.as_deref() == Some(contract.as_str()));
    }
    Ok(cases)
}

fn declaration_line(loaded: &LoadedUnit, contract: &str, name: &str) -> usize {
    find_function_in(&loaded.unit, contract, name)
        .and_then(|f| line_at(&loaded.source, f.src.start))
        .filter(|_| !loaded.source.is_empty())
        .unwrap_or(0)
}

fn print_reports(reports: &[TestReport], harness_name: &str) {
    for report in reports {
        let label = if report.contract.is_empty() {
            report.test.clone()
        } else {
            format!("{}.{}", report.contract, report.test)
        };
        if report.success {
            println!("PASS {}", label);
        } else {
            println!("FAIL {}", label);
            for line in report.message.lines() {
                println!("  {}", line);
            }
        }
        for call in &report.calls {
            let args: Vec<String> = call.arguments.iter().map(|a| a.to_string()).collect();
            println!("  -> {}.{}({})", harness_name, call.member, args.join(", "));
        }
    }
}

// ── list / dump ─────────────────────────────────────────────────────────

fn cmd_list(config: &Config, ast: &Path) -> i32 {
    let loaded = match load(config, ast, None) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let pattern = match config.test_regex() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for case in discover_tests(&loaded.unit, &pattern) {
        match case.contract {
            Some(contract) => println!("{}.{}", contract, case.name),
            None => println!("{}", case.name),
        }
    }
    0
}

fn cmd_dump(config: &Config, ast: &Path, function: &str, contract: Option<&str>) -> i32 {
    let loaded = match load(config, ast, None) {
        Ok(l) => l,
        Err(code) => return code,
    };
    match find_function_in(&loaded.unit, contract.unwrap_or_default(), function) {
        Some(f) => {
            print!("{}", printer::print(Node::Function(f)));
            0
        }
        None => {
            eprintln!("Error: function '{}' not found", function);
            1
        }
    }
}
