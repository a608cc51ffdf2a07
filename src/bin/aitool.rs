//! aitool CLI: 校验、测试、创建和管理 aitool.json 工具文档的命令行工具
//!
//! Usage:
//!   aitool validate <file> [--schema <schema.json>]   Validate a tool document
//!   aitool test <file> [--dry-run]                    Run contract tests
//!   aitool init <name> [-o <out>] [-c <category>]     Write a template document
//!   aitool list [<dir>]                               List tools in a directory
//!   aitool info <file> [-v]                           Show tool details
//!   aitool registry create [-o <out>]                 Write an empty registry.json
//!   aitool registry update <dir>                      Rebuild <dir>/registry.json

use std::collections::HashMap;
use std::path::PathBuf;

use aitool::contract::ContractRunner;
use aitool::registry::{RegistryIndex, INDEX_FILE_NAME};
use aitool::spec::{Category, SpecLoader, SpecValidator, ToolSpec};
use aitool::{EngineConfig, ExecutionEngine, Tool, ToolRegistry};

const REGISTRY_DIR_ENV: &str = "AITOOL_REGISTRY_DIR";

#[tokio::main]
async fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse(&raw);
    aitool::logging::init(args.value("--log-level").unwrap_or("warn"));

    let Some(command) = args.positional.first().cloned() else {
        print_usage();
        std::process::exit(1);
    };
    let rest = args.shifted();

    let code = match command.as_str() {
        "validate" => cmd_validate(&rest).await,
        "test" => cmd_test(&rest).await,
        "init" => cmd_init(&rest).await,
        "list" => cmd_list(&rest).await,
        "info" => cmd_info(&rest).await,
        "registry" => cmd_registry(&rest).await,
        "version" | "--version" | "-V" => {
            println!("aitool {}", env!("CARGO_PKG_VERSION"));
            0
        }
        "help" | "--help" | "-h" => {
            print_usage();
            0
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            1
        }
    };
    std::process::exit(code);
}

fn print_usage() {
    println!(
        r#"aitool: aitool.json 工具文档命令行工具

USAGE:
    aitool <COMMAND> [OPTIONS]

COMMANDS:
    validate <file> [--schema <path>]      Validate a tool document
    test <file> [--dry-run]                Run the document's contract tests
    init <name> [-o <out>] [-c <cat>]      Create a template document
    list [<dir>]                           List tools in a directory
    info <file> [-v]                       Show tool information
    registry create [-o <out>]             Create an empty registry.json
    registry update <dir>                  Rebuild <dir>/registry.json
    version                                Show version information
    help                                   Show this help message

OPTIONS:
    --log-level <level>                    Log filter when RUST_LOG is unset

ENVIRONMENT:
    AITOOL_REGISTRY_DIR                    Default directory for `list`
    AITOOL_LOG                             Log filter when RUST_LOG is unset
    AITOOL_ENFORCE_TIMEOUT                 Enforce timeout_seconds (default on)"#
    );
}

/// Positional arguments plus `--flag [value]` options.
struct Args {
    positional: Vec<String>,
    flags: HashMap<String, Option<String>>,
}

const VALUE_FLAGS: &[&str] = &["--schema", "--output", "--category", "--log-level"];

impl Args {
    fn parse(raw: &[String]) -> Self {
        let mut positional = Vec::new();
        let mut flags = HashMap::new();
        let mut iter = raw.iter();
        while let Some(arg) = iter.next() {
            let name = match arg.as_str() {
                "-o" => "--output",
                "-c" => "--category",
                "-v" => "--verbose",
                other => other,
            };
            if !name.starts_with('-') {
                positional.push(arg.clone());
            } else if VALUE_FLAGS.contains(&name) {
                flags.insert(name.to_string(), iter.next().cloned());
            } else {
                flags.insert(name.to_string(), None);
            }
        }
        Self { positional, flags }
    }

    /// Same options, first positional dropped.
    fn shifted(&self) -> Self {
        Self {
            positional: self.positional.iter().skip(1).cloned().collect(),
            flags: self.flags.clone(),
        }
    }

    fn arg(&self, i: usize) -> Option<&str> {
        self.positional.get(i).map(String::as_str)
    }

    fn value(&self, flag: &str) -> Option<&str> {
        self.flags.get(flag).and_then(|v| v.as_deref())
    }

    fn has(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }
}

fn require<'a>(args: &'a Args, i: usize, what: &str) -> Result<&'a str, i32> {
    args.arg(i).ok_or_else(|| {
        eprintln!("Error: missing <{what}>");
        1
    })
}

async fn cmd_validate(args: &Args) -> i32 {
    let file = match require(args, 0, "file") {
        Ok(f) => PathBuf::from(f),
        Err(code) => return code,
    };
    if !file.exists() {
        eprintln!("✗ File not found: {}", file.display());
        return 1;
    }

    let outcome = async {
        let raw = SpecLoader::new().load_value(&file).await?;
        if let Some(schema) = args.value("--schema") {
            SpecValidator::from_schema_file(schema).await?.validate(&raw)?;
        }
        ToolSpec::from_value(raw)
    }
    .await;

    match outcome {
        Ok(spec) => {
            let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            println!("✓ {} is valid", name);
            println!("  Tool: {} v{}", spec.manifest.name, spec.manifest.version);
            println!("  Category: {}", spec.manifest.category);
            0
        }
        Err(e) => {
            eprintln!("✗ Validation failed: {e}");
            1
        }
    }
}

async fn cmd_test(args: &Args) -> i32 {
    let file = match require(args, 0, "file") {
        Ok(f) => f,
        Err(code) => return code,
    };
    let tool = match Tool::from_file(file).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Test execution failed: {e}");
            return 1;
        }
    };
    let config = match EngineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    let runner = ContractRunner::new(ExecutionEngine::default().with_config(config))
        .dry_run(args.has("--dry-run"));
    let report = match runner.run(&tool).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Test execution failed: {e}");
            return 1;
        }
    };

    if report.cases.is_empty() {
        println!("No contract tests defined");
        return 0;
    }
    for case in &report.cases {
        match &case.failure {
            None => println!("  ✓ {} passed", case.name),
            Some(reason) => println!("  ✗ {} failed: {}", case.name, reason),
        }
    }
    println!();
    println!("Results: {} passed, {} failed", report.passed(), report.failed());
    if report.is_success() {
        0
    } else {
        1
    }
}

async fn cmd_init(args: &Args) -> i32 {
    let name = match require(args, 0, "name") {
        Ok(n) => n,
        Err(code) => return code,
    };
    let category = Category::from(args.value("--category").unwrap_or("other"));
    if !category.is_known() {
        eprintln!(
            "Error: unknown category '{}' (expected one of: {})",
            category,
            Category::KNOWN.join(", ")
        );
        return 1;
    }
    let output = PathBuf::from(args.value("--output").unwrap_or("tool.aitool.json"));

    let doc = aitool::template::scaffold(name, &category);
    let body = match serde_json::to_string_pretty(&doc) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    if let Err(e) = tokio::fs::write(&output, body).await {
        eprintln!("Error: failed to write {}: {e}", output.display());
        return 1;
    }
    println!("✓ Created template: {}", output.display());
    println!("  Edit the file to complete the tool specification");
    0
}

async fn cmd_list(args: &Args) -> i32 {
    let dir = match args
        .arg(0)
        .map(PathBuf::from)
        .or_else(|| std::env::var(REGISTRY_DIR_ENV).ok().map(PathBuf::from))
    {
        Some(d) => d,
        None => {
            eprintln!("Error: missing <dir> (or set {REGISTRY_DIR_ENV})");
            return 1;
        }
    };

    let registry = match ToolRegistry::from_directory(&dir).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to list tools: {e}");
            return 1;
        }
    };
    let tools = registry.list();
    if tools.is_empty() {
        println!("No tools found");
        return 0;
    }

    println!("Found {} tools:", tools.len());
    println!();
    for t in tools {
        println!("  {} (v{})", t.name, t.version);
        println!("    Category: {}", t.category);
        println!("    {}", truncate(&t.description, 80));
        println!();
    }
    0
}

async fn cmd_info(args: &Args) -> i32 {
    let file = match require(args, 0, "file") {
        Ok(f) => f,
        Err(code) => return code,
    };
    let tool = match Tool::from_file(file).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to load tool info: {e}");
            return 1;
        }
    };

    let m = tool.manifest();
    let caps = tool.capabilities();
    println!();
    println!("{}", m.title());
    println!("{}", "=".repeat(60));
    println!("ID:          {}", m.id);
    println!("Version:     {}", m.version);
    println!("Category:    {}", m.category);
    println!("Description: {}", m.description);
    println!();
    println!("Capabilities:");
    println!("  Primary:    {}", caps.primary_function);
    println!("  Idempotent: {}", caps.idempotent);
    println!("  Stateful:   {}", caps.stateful);

    if let Some(latency) = tool
        .spec()
        .extension("operations")
        .and_then(|ops| ops.get("performance"))
        .and_then(|perf| perf.get("latency_ms"))
    {
        println!();
        println!("Performance:");
        for p in ["p50", "p95", "p99"] {
            if let Some(v) = latency.get(p) {
                println!("  {p}: {v}ms");
            }
        }
    }

    if !tool.error_handlers().is_empty() {
        println!();
        println!("Error handling:");
        for rule in tool.error_handlers() {
            println!("  {} -> {}", rule.error_type, rule.strategy);
        }
    }

    if args.has("--verbose") {
        println!();
        println!("Full specification:");
        match serde_json::to_string_pretty(tool.to_value()) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    }
    0
}

async fn cmd_registry(args: &Args) -> i32 {
    match args.arg(0) {
        Some("create") => {
            let output = PathBuf::from(args.value("--output").unwrap_or(INDEX_FILE_NAME));
            match RegistryIndex::new().save(&output).await {
                Ok(()) => {
                    println!("✓ Created registry: {}", output.display());
                    0
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    1
                }
            }
        }
        Some("update") => {
            let dir = match require(args, 1, "dir") {
                Ok(d) => PathBuf::from(d),
                Err(code) => return code,
            };
            let index_path = dir.join(INDEX_FILE_NAME);
            let mut index = if index_path.is_file() {
                match RegistryIndex::load(&index_path).await {
                    Ok(i) => i,
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return 1;
                    }
                }
            } else {
                RegistryIndex::new()
            };

            let count = match index.rebuild_from_directory(&dir).await {
                Ok(n) => n,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return 1;
                }
            };
            if let Err(e) = index.save(&index_path).await {
                eprintln!("Error: {e}");
                return 1;
            }
            println!("✓ Updated registry with {count} tools");
            0
        }
        Some(other) => {
            eprintln!("Unknown registry command: {other} (expected create or update)");
            1
        }
        None => {
            eprintln!("Error: missing registry command (create or update)");
            1
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}
