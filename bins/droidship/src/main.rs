//! droidship CLI
//!
//! Post-build artifact collection and signing configuration checks for
//! Flutter Android projects.

use anyhow::Result;
use clap::{Parser, Subcommand};
use droidship_android::artifacts::{ArtifactCollector, ArtifactKind, CollectionResult};
use droidship_android::build_config::{BuildConfiguration, BuildType};
use droidship_android::gradle;
use droidship_android::signing::SigningConfigs;
use droidship_android::tasks::{GradleRunner, TaskRegistry, TaskRunner};
use droidship_cli::output::{self, format_count, format_duration, format_size, Status};
use droidship_core::config::Config;
use droidship_core::error::{exit_codes, Error};
use droidship_core::health::{HealthChecker, HealthStatus, PathCheck};
use droidship_telemetry::TelemetryConfig;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "droidship")]
#[command(about = "Collect Android build artifacts and inspect signing configuration")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Android project directory (contains gradlew)
    #[arg(long, global = true, env = "DROIDSHIP_ANDROID_DIR")]
    android_dir: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every file from a build output directory into a destination
    Collect {
        /// Directory (or single file) produced by the build
        #[arg(long)]
        source: PathBuf,
        /// Directory receiving the copies
        #[arg(long)]
        dest: PathBuf,
        /// Label used in messages
        #[arg(long, default_value = "artifacts")]
        label: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Collect APKs or bundles from their conventional Gradle locations
    #[command(name = "collect-kind")]
    CollectKind {
        /// Artifact kind: apk, bundle
        #[arg(long, default_value = "apk")]
        kind: String,
        /// Build type: debug, release
        #[arg(long, default_value = "release")]
        build_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy the single APK produced for a variant
    #[command(name = "collect-variant")]
    CollectVariant {
        /// Build type: debug, release
        #[arg(long, default_value = "release")]
        build_type: String,
        /// Product flavor
        #[arg(long)]
        flavor: Option<String>,
        /// Destination directory (defaults to the collected flutter-apk dir)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered collection tasks
    Tasks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a collection task and its Gradle dependency
    Run {
        /// Task name, e.g. assembleDebugAndCopy
        task: String,
        /// Collect without running the Gradle dependency
        #[arg(long)]
        skip_deps: bool,
        /// Stream Gradle output instead of showing a spinner
        #[arg(long)]
        stream: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which build types carry a signing identity
    Signing {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build an APK or bundle, optionally collecting the outputs
    Build {
        /// Build type: debug, release
        #[arg(long, default_value = "debug")]
        build_type: String,
        /// Build bundle (AAB) instead of APK
        #[arg(long)]
        bundle: bool,
        /// Clean before building
        #[arg(long)]
        clean: bool,
        /// Collect outputs after a successful build
        #[arg(long)]
        copy: bool,
        /// Stream Gradle output instead of showing a spinner
        #[arg(long)]
        stream: bool,
    },

    /// Diagnose environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }
    output::set_quiet(cli.quiet);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            Status::error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    };

    droidship_telemetry::init_with_config(TelemetryConfig {
        log_level: droidship_telemetry::level_for(&config.schema.log.level, cli.verbose, cli.quiet)
            .to_string(),
        show_target: cli.verbose > 1,
        json: cli.log_json,
        ansi: !cli.no_color && std::io::stderr().is_terminal(),
    })?;

    if let Some(path) = &config.path {
        tracing::debug!(config = %path.display(), "Loaded configuration");
    }

    let android_dir = config.android_dir(cli.android_dir.as_deref());

    let exit_code = match cli.command {
        Commands::Collect {
            source,
            dest,
            label,
            json,
        } => run_collect(&source, &dest, &label, json),
        Commands::CollectKind {
            kind,
            build_type,
            json,
        } => run_collect_kind(&config, &android_dir, &kind, &build_type, json),
        Commands::CollectVariant {
            build_type,
            flavor,
            dest,
            json,
        } => run_collect_variant(
            &config,
            &android_dir,
            &build_type,
            flavor.as_deref(),
            dest.as_deref(),
            json,
        ),
        Commands::Tasks { json } => run_tasks(&config, &android_dir, json),
        Commands::Run {
            task,
            skip_deps,
            stream,
            json,
        } => run_task(&config, &android_dir, &task, skip_deps, stream, json),
        Commands::Signing { json } => run_signing(&config, &android_dir, json),
        Commands::Build {
            build_type,
            bundle,
            clean,
            copy,
            stream,
        } => run_build(&config, &android_dir, &build_type, bundle, clean, copy, stream),
        Commands::Doctor { json } => run_doctor(&config, &android_dir, json),
    };

    std::process::exit(exit_code);
}

/// Print an error (as a JSON report when requested) and map it to an exit code
fn report_error(err: &Error, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(&err.to_report()) {
            Ok(s) => println!("{s}"),
            Err(_) => Status::error(&err.to_string()),
        }
    } else {
        Status::error(&err.to_string());
    }
    err.exit_code()
}

fn print_json(value: &impl serde::Serialize) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{s}");
            exit_codes::SUCCESS
        }
        Err(e) => report_error(&e.into(), false),
    }
}

fn print_collection(result: &CollectionResult, json: bool) -> i32 {
    if json {
        return print_json(result);
    }

    // The collector already logged the summary or the skip warning
    if let CollectionResult::Copied { files, bytes, .. } = result {
        Status::success(&format!(
            "{} collected ({})",
            format_count(files.len(), "file", "files"),
            format_size(*bytes)
        ));
        for file in files {
            Status::detail(&file.display().to_string());
        }
    }
    exit_codes::SUCCESS
}

fn collector(config: &Config, android_dir: &Path) -> ArtifactCollector {
    ArtifactCollector::new(
        android_dir,
        config.schema.project.app_module.clone(),
        &config.schema.project.repo_build_root,
    )
}

fn load_signing(config: &Config, android_dir: &Path) -> droidship_core::Result<SigningConfigs> {
    SigningConfigs::load(
        &android_dir.join(&config.schema.signing.properties_file),
        &android_dir.join(&config.schema.project.app_module),
    )
}

fn run_collect(source: &Path, dest: &Path, label: &str, json: bool) -> i32 {
    match droidship_android::collect(source, dest, label) {
        Ok(result) => print_collection(&result, json),
        Err(e) => report_error(&e, json),
    }
}

fn run_collect_kind(
    config: &Config,
    android_dir: &Path,
    kind: &str,
    build_type: &str,
    json: bool,
) -> i32 {
    let parsed = kind
        .parse::<ArtifactKind>()
        .and_then(|k| build_type.parse::<BuildType>().map(|b| (k, b)));
    let (kind, build_type) = match parsed {
        Ok(pair) => pair,
        Err(e) => return report_error(&e, json),
    };

    match collector(config, android_dir).collect_kind(kind, build_type) {
        Ok(result) => print_collection(&result, json),
        Err(e) => report_error(&e, json),
    }
}

fn run_collect_variant(
    config: &Config,
    android_dir: &Path,
    build_type: &str,
    flavor: Option<&str>,
    dest: Option<&Path>,
    json: bool,
) -> i32 {
    let build_type = match build_type.parse::<BuildType>() {
        Ok(b) => b,
        Err(e) => return report_error(&e, json),
    };

    match collector(config, android_dir).collect_variant_apk(flavor, build_type, dest) {
        Ok(result) => print_collection(&result, json),
        Err(e) => report_error(&e, json),
    }
}

fn run_tasks(config: &Config, android_dir: &Path, json: bool) -> i32 {
    let registry = match TaskRegistry::from_config(&config.schema, android_dir) {
        Ok(r) => r,
        Err(e) => return report_error(&e, json),
    };

    if json {
        return print_json(&registry.list());
    }

    let mut groups: Vec<&str> = Vec::new();
    for task in registry.list() {
        if !groups.contains(&task.group.as_str()) {
            groups.push(&task.group);
        }
    }
    for group in groups {
        println!();
        println!("{}", format!("{} tasks", capitalize(group)).bold());
        for task in registry.list().iter().filter(|t| t.group == group) {
            let description = task.description.as_deref().unwrap_or("");
            println!("  {} - {}", task.name.cyan(), description);
            println!("      {} {}", "depends on".dimmed(), task.depends_on);
        }
    }
    exit_codes::SUCCESS
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn run_task(
    config: &Config,
    android_dir: &Path,
    task: &str,
    skip_deps: bool,
    stream: bool,
    json: bool,
) -> i32 {
    let registry = match TaskRegistry::from_config(&config.schema, android_dir) {
        Ok(r) => r,
        Err(e) => return report_error(&e, json),
    };

    let timer = droidship_telemetry::Timer::start(task);
    let result = registry.run(task, &GradleRunner { stream }, skip_deps);
    timer.stop();

    match result {
        Ok(result) => print_collection(&result, json),
        Err(e) => report_error(&e, json),
    }
}

fn run_signing(config: &Config, android_dir: &Path, json: bool) -> i32 {
    let signing = match load_signing(config, android_dir) {
        Ok(s) => s,
        Err(e) => return report_error(&e, json),
    };

    if json {
        return print_json(&signing.summaries());
    }

    match signing.source() {
        Some(path) => Status::info(&format!("Signing credentials from {}", path.display())),
        None => Status::warning("No keystore properties file; all build types are unsigned"),
    }

    for summary in signing.summaries() {
        if !summary.signed {
            println!("  {:<8} {}", summary.variant, "unsigned".yellow());
            continue;
        }
        let alias = summary.key_alias.as_deref().unwrap_or_default();
        let store = match &summary.store_file {
            Some(path) if summary.store_file_exists => path.display().to_string(),
            Some(path) => format!("{} {}", path.display(), "(missing)".red()),
            None => "no store file".dimmed().to_string(),
        };
        println!("  {:<8} {} alias={alias} store={store}", summary.variant, "signed".green());
    }
    exit_codes::SUCCESS
}

fn run_build(
    config: &Config,
    android_dir: &Path,
    build_type: &str,
    bundle: bool,
    clean: bool,
    copy: bool,
    stream: bool,
) -> i32 {
    let build_type = match build_type.parse::<BuildType>() {
        Ok(b) => b,
        Err(e) => return report_error(&e, false),
    };
    let kind = if bundle {
        ArtifactKind::Bundle
    } else {
        ArtifactKind::Apk
    };

    // Same point at which Gradle evaluates signingConfigs
    let build_config = match load_signing(config, android_dir) {
        Ok(signing) => BuildConfiguration::from_signing(&signing),
        Err(e) => return report_error(&e, false),
    };
    if !build_config.is_signed(build_type) {
        Status::warning(&format!(
            "{build_type} build has no signing configuration from keystore properties"
        ));
    }

    if clean {
        Status::info("Cleaning...");
        match gradle::clean(android_dir) {
            Ok(r) if r.success => {}
            Ok(r) => {
                Status::error("Clean failed");
                eprintln!("{}", r.stderr);
                return exit_codes::FAILURE;
            }
            Err(e) => return report_error(&e, false),
        }
    }

    let task = gradle::task_for(&config.schema.project.app_module, kind, build_type);
    let timer = droidship_telemetry::Timer::start(task.as_str());
    if let Err(e) = (GradleRunner { stream }).run_gradle_task(android_dir, &task) {
        return report_error(&e, false);
    }
    let elapsed = timer.stop();
    Status::success(&format!("{task} succeeded in {}", format_duration(elapsed)));

    if !copy {
        return exit_codes::SUCCESS;
    }

    match collector(config, android_dir).collect_kind(kind, build_type) {
        Ok(result) => print_collection(&result, false),
        Err(e) => report_error(&e, false),
    }
}

fn run_doctor(config: &Config, android_dir: &Path, json: bool) -> i32 {
    let collector = collector(config, android_dir);
    let (apk_dir, _) = collector.paths_for(ArtifactKind::Apk, BuildType::Release);

    let report = HealthChecker::new()
        .add_check(PathCheck::required("android project", android_dir))
        .add_check(PathCheck::required(
            "gradle wrapper",
            gradle::wrapper_path(android_dir),
        ))
        .add_check(PathCheck::optional(
            "keystore properties",
            android_dir.join(&config.schema.signing.properties_file),
        ))
        .add_check(PathCheck::optional("apk outputs", apk_dir))
        .with_toolchain_checks()
        .run();

    if json {
        print_json(&report);
    } else {
        Status::header("Environment Check");
        for check in &report.checks {
            let line = match &check.message {
                Some(message) => format!("{}: {message}", check.name),
                None => match check.details.get("version").or_else(|| check.details.get("path")) {
                    Some(detail) => format!("{}: {detail}", check.name),
                    None => check.name.clone(),
                },
            };
            match check.status {
                HealthStatus::Healthy => Status::success(&line),
                HealthStatus::Degraded => Status::warning(&line),
                HealthStatus::Unhealthy => Status::error(&line),
            }
        }
    }

    if report.status.is_operational() {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}
