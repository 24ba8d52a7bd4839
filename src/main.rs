use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use textlens::cli::{Cli, Commands, ConfigAction};
use textlens::client::HttpBackend;
use textlens::config::Config;
use textlens::controller::{parse_similarity_input, Controller};
use textlens::error::{Result, TextlensError};
use textlens::export::{BundleOutcome, BundlePreset, DirectorySink};
use textlens::models::ConversionDirection;
use textlens::render::{analysis_view, similarity_matrix};
use textlens::session::ReportArtifact;

/// Options shared by every subcommand
struct GlobalArgs {
    config: Option<PathBuf>,
    profile: Option<String>,
    output_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let globals = GlobalArgs {
        config: cli.config,
        profile: cli.profile,
        output_dir: cli.output_dir,
    };

    match cli.command {
        Commands::Analyze {
            text,
            file,
            sample,
            report,
            bundle,
            json,
            csv,
            everything,
        } => {
            let options = AnalyzeOptions {
                report,
                bundle,
                json,
                csv,
                everything,
            };
            cmd_analyze(&globals, text, file, sample, options)?;
        }
        Commands::Convert { text, to, save } => {
            cmd_convert(&globals, &text, to.into(), save)?;
        }
        Commands::Similarity {
            texts,
            example,
            file,
            report_with,
        } => {
            cmd_similarity(&globals, texts, example, file, report_with)?;
        }
        Commands::Upload { path, analyze } => {
            cmd_upload(&globals, &path, analyze)?;
        }
        Commands::Capabilities => {
            cmd_capabilities(&globals)?;
        }
        Commands::Report {
            text,
            compare,
            download,
        } => {
            cmd_report(&globals, &text, compare, download)?;
        }
        Commands::Shell => {
            cmd_shell(&globals)?;
        }
        Commands::Config { action } => {
            cmd_config(globals.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "textlens=debug" } else { "textlens=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| TextlensError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })
}

fn build_controller(globals: &GlobalArgs) -> Result<Controller> {
    let mut config = load_config(globals.config.clone(), globals.profile.clone())?;
    if let Some(dir) = &globals.output_dir {
        config.export.output_dir = dir.clone();
    }

    let output_dir = expand_path(&config.export.output_dir)?;
    let backend = HttpBackend::new(config.api.base_url.clone())?;
    tracing::debug!("Using analysis service at {}", config.api.base_url);

    Ok(Controller::new(
        config,
        Arc::new(backend),
        Arc::new(DirectorySink::new(output_dir)),
    ))
}

struct AnalyzeOptions {
    report: bool,
    bundle: Option<BundlePreset>,
    json: bool,
    csv: bool,
    everything: bool,
}

fn cmd_analyze(
    globals: &GlobalArgs,
    text: Option<String>,
    file: Option<PathBuf>,
    sample: bool,
    options: AnalyzeOptions,
) -> Result<()> {
    let mut controller = build_controller(globals)?;
    runtime()?.block_on(async {
        let text = match (text, file) {
            (_, Some(path)) => read_text_file(&path)?,
            (Some(text), None) => text,
            (None, None) if sample => controller.sample_text().await?,
            (None, None) => return Err(TextlensError::invalid_input("請輸入要分析的文本")),
        };

        let view = controller.analyze(&text).await?;
        println!("{}", view);

        if options.report {
            let artifact = controller.report().await?;
            print_report(&artifact);
        }
        if let Some(preset) = options.bundle {
            print_bundle(&controller.bundle(preset).await?);
        }
        if options.json {
            println!("✓ JSON saved to {}", controller.export_json()?.display());
        }
        if options.csv {
            println!("✓ CSV saved to {}", controller.export_csv()?.display());
        }
        if options.everything {
            let outcome = controller.export_everything().await?;
            if let Some(bundle) = &outcome.bundle {
                print_bundle(bundle);
            }
            println!("✓ JSON saved to {}", outcome.json.display());
        }
        Ok(())
    })
}

fn cmd_convert(
    globals: &GlobalArgs,
    text: &str,
    direction: ConversionDirection,
    save: bool,
) -> Result<()> {
    let mut controller = build_controller(globals)?;
    runtime()?.block_on(async {
        let converted = controller.convert(text, direction).await?;
        println!("{}", converted);

        if save {
            println!("✓ Saved to {}", controller.save_conversion()?.display());
        }
        Ok(())
    })
}

fn cmd_similarity(
    globals: &GlobalArgs,
    texts: Vec<String>,
    example: bool,
    file: Option<PathBuf>,
    report_with: Option<String>,
) -> Result<()> {
    let texts = if example {
        Controller::similarity_example()
    } else if let Some(path) = file {
        parse_similarity_input(&read_text_file(&path)?)
    } else {
        texts
    };

    let mut controller = build_controller(globals)?;
    runtime()?.block_on(async {
        let view = controller.similarity(&texts).await?;
        println!("文本相似度矩陣");
        println!("{}", view);

        if let Some(text) = report_with {
            controller.analyze(&text).await?;
            let artifact = controller.report().await?;
            print_report(&artifact);
        }
        Ok(())
    })
}

fn cmd_upload(globals: &GlobalArgs, path: &Path, analyze: bool) -> Result<()> {
    let mut controller = build_controller(globals)?;
    runtime()?.block_on(async {
        let preview = controller.upload(path).await?;
        println!("{}", preview);

        if analyze {
            let view = controller.analyze_file_content().await?;
            println!("{}", view);
        }
        Ok(())
    })
}

fn cmd_capabilities(globals: &GlobalArgs) -> Result<()> {
    let controller = build_controller(globals)?;
    let report = runtime()?.block_on(controller.capabilities())?;
    println!("{}", report);
    Ok(())
}

fn cmd_report(
    globals: &GlobalArgs,
    text: &str,
    compare: Vec<String>,
    download: bool,
) -> Result<()> {
    let mut controller = build_controller(globals)?;
    runtime()?.block_on(async {
        controller.analyze(text).await?;

        if !compare.is_empty() {
            let mut texts = vec![text.to_string()];
            texts.extend(compare);
            controller.similarity(&texts).await?;
        }

        let artifact = controller.report().await?;
        print_report(&artifact);
        for preview in controller.report_previews() {
            print!("{}", preview);
        }

        if download {
            println!("✓ Report saved to {}", controller.download_report().await?.display());
        }
        Ok(())
    })
}

const SHELL_HELP: &str = "\
Commands:
  analyze [text]              analyze text (or the loaded sample)
  sample                      load the sample text
  similarity <a> | <b> | ...  compare texts; `similarity example` uses the examples
  convert <traditional|simplified> <text>
  convert save                save the last conversion
  upload <path>               parse a document
  analyze-file                analyze the uploaded document
  interactive                 generate interactive charts
  report [download]           generate (and save) a comprehensive report
  bundle <basic|advanced|all> download charts
  json | csv | everything     save analysis data
  show                        print the cached results
  help                        show this help
  quit                        leave the shell";

fn cmd_shell(globals: &GlobalArgs) -> Result<()> {
    let mut controller = build_controller(globals)?;
    let rt = runtime()?;
    let mut draft: Option<String> = None;

    println!(
        "textlens shell (session {}, started {})",
        controller.session().id(),
        controller.session().started_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Type 'help' for commands.");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("textlens> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| TextlensError::Io {
            source: e,
            context: "Failed to read from stdin".to_string(),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        if matches!(command, "quit" | "exit") {
            break;
        }

        let outcome = rt.block_on(shell_command(&mut controller, &mut draft, command, rest));
        if let Err(e) = outcome {
            println!("✗ {}", e);
        }
    }

    Ok(())
}

async fn shell_command(
    controller: &mut Controller,
    draft: &mut Option<String>,
    command: &str,
    rest: &str,
) -> Result<()> {
    match command {
        "analyze" => {
            let text = if rest.is_empty() {
                draft.take().unwrap_or_default()
            } else {
                rest.to_string()
            };
            println!("{}", controller.analyze(&text).await?);
        }
        "sample" => {
            let text = controller.sample_text().await?;
            println!("{}", text);
            println!("(sample loaded; run 'analyze' to analyze it)");
            *draft = Some(text);
        }
        "similarity" => {
            let texts = if rest == "example" {
                Controller::similarity_example()
            } else {
                rest.split('|').map(|t| t.trim().to_string()).collect()
            };
            println!("{}", controller.similarity(&texts).await?);
        }
        "convert" => {
            if rest == "save" {
                println!("✓ Saved to {}", controller.save_conversion()?.display());
                return Ok(());
            }
            let (target, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let direction = match target {
                "traditional" | "t" => ConversionDirection::ToTraditional,
                "simplified" | "s" => ConversionDirection::ToSimplified,
                other => {
                    return Err(TextlensError::invalid_input(format!(
                        "unknown conversion target '{}'",
                        other
                    )))
                }
            };
            println!("{}", controller.convert(text, direction).await?);
        }
        "upload" => {
            println!("{}", controller.upload(Path::new(rest)).await?);
        }
        "analyze-file" => {
            println!("{}", controller.analyze_file_content().await?);
        }
        "interactive" => {
            let result = controller.interactive().await?;
            for (kind, url) in &result.visualizations {
                println!("  {:<28} {}", kind, url);
            }
        }
        "report" => {
            let artifact = controller.report().await?;
            print_report(&artifact);
            if rest == "download" {
                println!("✓ Report saved to {}", controller.download_report().await?.display());
            }
        }
        "bundle" => {
            let preset: BundlePreset = rest.parse().map_err(TextlensError::InvalidInput)?;
            print_bundle(&controller.bundle(preset).await?);
        }
        "json" => {
            println!("✓ JSON saved to {}", controller.export_json()?.display());
        }
        "csv" => {
            println!("✓ CSV saved to {}", controller.export_csv()?.display());
        }
        "everything" => {
            let outcome = controller.export_everything().await?;
            if let Some(bundle) = &outcome.bundle {
                print_bundle(bundle);
            }
            println!("✓ JSON saved to {}", outcome.json.display());
        }
        "show" => show_session(controller),
        "help" => println!("{}", SHELL_HELP),
        other => {
            return Err(TextlensError::invalid_input(format!(
                "unknown command '{}', type 'help'",
                other
            )))
        }
    }
    Ok(())
}

fn show_session(controller: &Controller) {
    let session = controller.session();
    let render = &controller.config().render;

    if let Some(analysis) = session.analysis_result() {
        println!("{}", analysis_view(analysis, render));
    }
    if let Some(similarity) = session.similarity() {
        println!("文本相似度矩陣");
        println!("{}", similarity_matrix(similarity, render.label_width));
    }
    if let Some(conversion) = session.conversion() {
        println!("轉換結果:\n{}", conversion.text);
    }
    if let Some(report) = session.report() {
        print_report(report);
    }
    for preview in controller.report_previews() {
        print!("{}", preview);
    }
}

fn print_report(artifact: &ReportArtifact) {
    println!("✓ Report generated: {}", artifact.report_id);
    println!("  View: {}", artifact.view_url);
}

fn print_bundle(outcome: &BundleOutcome) {
    match outcome {
        BundleOutcome::Single { path } => {
            println!("✓ Saved {}", path.display());
        }
        BundleOutcome::Archive {
            path,
            entries,
            requested,
            ..
        } => {
            println!(
                "✓ Saved {} ({} of {} charts)",
                path.display(),
                entries.len(),
                requested
            );
        }
    }
}

fn read_text_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| TextlensError::Io {
        source: e,
        context: format!("Failed to read {}", path.display()),
    })
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, None)?;
            let rendered = match section {
                Some(section) => {
                    let value = config.get_value(&section)?;
                    format!("[{}]\n{}", section, toml::to_string_pretty(&value)?)
                }
                None => toml::to_string_pretty(&config)?,
            };
            println!("{}", rendered);
        }
        ConfigAction::Get { key } => {
            let config = load_config(config_path, None)?;
            match config.get_value(&key)? {
                toml::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TextlensError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::SetProfile { profile } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let mut config = Config::read(&path)?;
            config.set_active_profile(&profile)?;
            config.save(&path)?;
            println!("✓ Active profile set to: {}", profile);
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if path.exists() {
        Config::load_with_profile(&path, profile.as_deref())
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'textlens config init' to create one."
        );
        Config::default().resolve(profile.as_deref())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| TextlensError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| TextlensError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
