use anyhow::{bail, Context, Result};
use clap::Parser;
use polyport::{convert_batch, extract, ConvertError, ErrorFormatter, Options, Registry, Severity, SourceFile};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

/// Translate source files between programming languages
#[derive(Parser, Debug)]
#[command(name = "polyport", author, version, about, long_about = None)]
struct Cli {
    /// Files or directories to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target language
    #[arg(short, long)]
    to: String,

    /// Source language; inferred from file extensions when absent
    #[arg(short, long)]
    from: Option<String>,

    /// Output directory; converted text goes to stdout when absent
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// JSON file of conversion options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Print the canonical tree of each input as JSON instead of converting
    #[arg(long)]
    dump_ast: bool,

    /// Report diagnostics as one JSON document on stderr
    #[arg(long)]
    diagnostics_json: bool,
}

/// One input file with its source tag
struct Input {
    path: PathBuf,
    /// Path relative to the walked directory, used for output placement
    relative: PathBuf,
    file: SourceFile,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: String,
    output: Option<String>,
    error: Option<&'a ConvertError>,
    diagnostics: Option<&'a polyport::Diagnostics>,
}

fn source_tag(registry: &Registry, from: Option<&str>, path: &Path) -> Option<String> {
    if let Some(tag) = from {
        return Some(tag.to_string());
    }
    let extension = path.extension()?.to_str()?;
    registry
        .frontend_for_extension(extension)
        .map(|frontend| frontend.language().to_string())
}

fn collect_inputs(registry: &Registry, cli: &Cli) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for root in &cli.inputs {
        if root.is_dir() {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.with_context(|| format!("walking {}", root.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                // Inside directories only files a front-end claims are picked up
                let claimed = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(|e| registry.frontend_for_extension(e));
                let Some(frontend) = claimed else {
                    continue;
                };
                if let Some(from) = cli.from.as_deref() {
                    if polyport::canonical_tag(from) != frontend.language() {
                        continue;
                    }
                }
                let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
                inputs.push(Input {
                    path: path.to_path_buf(),
                    relative,
                    file: SourceFile::new(text, frontend.language()),
                });
            }
        } else {
            let Some(tag) = source_tag(registry, cli.from.as_deref(), root) else {
                bail!("cannot infer the language of {}; pass --from", root.display());
            };
            let text = fs::read_to_string(root).with_context(|| format!("reading {}", root.display()))?;
            let relative = root.file_name().map(PathBuf::from).unwrap_or_else(|| root.clone());
            inputs.push(Input {
                path: root.clone(),
                relative,
                file: SourceFile::new(text, tag),
            });
        }
    }
    Ok(inputs)
}

fn load_options(path: Option<&Path>) -> Result<Options> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading options {}", path.display()))?;
            Ok(Options::from_json_str(&text).with_context(|| format!("parsing options {}", path.display()))?)
        }
        None => Ok(Options::new()),
    }
}

/// Output path under `out`, falling back to the input's own name on clashes
fn output_path(out: &Path, input: &Input, suggested: Option<&str>, extension: &str, used: &mut BTreeSet<PathBuf>) -> PathBuf {
    let directory = out.join(input.relative.parent().unwrap_or_else(|| Path::new("")));
    let fallback = input.relative.with_extension(extension);
    let fallback = fallback.file_name().map(PathBuf::from).unwrap_or(fallback);
    let candidate = match suggested {
        Some(name) => directory.join(name),
        None => directory.join(&fallback),
    };
    let path = if used.contains(&candidate) {
        directory.join(fallback)
    } else {
        candidate
    };
    used.insert(path.clone());
    path
}

fn dump_ast(registry: &Registry, inputs: &[Input]) -> Result<ExitCode> {
    let mut failed = false;
    for input in inputs {
        match extract(registry, &input.file) {
            Ok(extraction) => {
                println!("{}", extraction.ast.to_json());
                for warning in extraction.diagnostics.warnings().iter().chain(extraction.diagnostics.errors()) {
                    log::warn!("{}: {}", input.path.display(), warning);
                }
            }
            Err(e) => {
                eprintln!("{}: {}", input.path.display(), e);
                failed = true;
            }
        }
    }
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let registry = Registry::builtin();
    let backend = registry.backend(&cli.to)?;
    let options = load_options(cli.options.as_deref())?;
    let inputs = collect_inputs(&registry, &cli)?;
    if inputs.is_empty() {
        bail!("no convertible files found");
    }

    if cli.dump_ast {
        return dump_ast(&registry, &inputs);
    }

    let files: Vec<SourceFile> = inputs.iter().map(|input| input.file.clone()).collect();
    let results = convert_batch(&registry, &files, &cli.to, &options);

    if let Some(out) = &cli.out {
        fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    }
    let color = std::io::stderr().is_terminal();
    let mut used = BTreeSet::new();
    let mut reports = Vec::new();
    let mut failed = 0;
    for (input, result) in inputs.iter().zip(&results) {
        let display = input.path.display().to_string();
        match result {
            Ok(conversion) => {
                let written = match &cli.out {
                    Some(out) => {
                        let path = output_path(out, input, conversion.suggested_name.as_deref(), backend.extension(), &mut used);
                        if let Some(parent) = path.parent() {
                            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
                        }
                        fs::write(&path, &conversion.text).with_context(|| format!("writing {}", path.display()))?;
                        Some(path.display().to_string())
                    }
                    None => {
                        println!("{}", conversion.text);
                        None
                    }
                };
                if !cli.diagnostics_json {
                    let tagged = conversion
                        .diagnostics
                        .errors()
                        .iter()
                        .map(|e| (e, Severity::Error))
                        .chain(conversion.diagnostics.warnings().iter().map(|w| (w, Severity::Warning)));
                    for (diagnostic, severity) in tagged {
                        let formatted = ErrorFormatter::new(diagnostic, &input.file.text)
                            .with_filename(&display)
                            .with_severity(severity)
                            .with_color(color)
                            .format();
                        eprintln!("{}\n", formatted);
                    }
                }
                reports.push(FileReport {
                    path: display,
                    output: written,
                    error: None,
                    diagnostics: Some(&conversion.diagnostics),
                });
            }
            Err(e) => {
                failed += 1;
                if !cli.diagnostics_json {
                    eprintln!("{}: {}", display, e);
                }
                reports.push(FileReport {
                    path: display,
                    output: None,
                    error: Some(e),
                    diagnostics: None,
                });
            }
        }
    }

    if cli.diagnostics_json {
        eprintln!("{}", serde_json::to_string_pretty(&reports)?);
    }
    log::info!("{} of {} file(s) converted", inputs.len() - failed, inputs.len());
    Ok(if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
