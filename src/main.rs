//! `vdat-export`: write a project's curated 2D boxes as a COCO or YOLO dataset.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;

    use clap::Parser;
    use vdat::config::AppConfig;
    use vdat::format::{ExportOptions, WarningSeverity};
    use vdat::workspace::Workspace;

    #[derive(Parser)]
    #[command(name = "vdat-export")]
    #[command(about = "Export curated bounding boxes from a vdat workspace")]
    pub struct Args {
        /// Exporter id (see --list)
        #[arg(long, short, default_value = "coco")]
        format: String,

        /// Directory the export file is written to
        #[arg(long, short, default_value = ".")]
        output: PathBuf,

        /// Project id; defaults to the active project
        #[arg(long, conflicts_with = "project_name")]
        project: Option<u64>,

        /// Project name, matched exactly
        #[arg(long)]
        project_name: Option<String>,

        /// Config file; defaults to the platform config directory
        #[arg(long)]
        config: Option<PathBuf>,

        /// Blob database, overriding the config
        #[arg(long)]
        database: Option<PathBuf>,

        /// Settings file, overriding the config
        #[arg(long)]
        settings: Option<PathBuf>,

        /// List projects and exporters, then exit
        #[arg(long)]
        list: bool,
    }

    fn load_config(args: &Args) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut config = match &args.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(database) = &args.database {
            config.storage.database_path = Some(database.clone());
        }
        if let Some(settings) = &args.settings {
            config.storage.settings_path = Some(settings.clone());
        }
        Ok(config)
    }

    fn init_logging(config: &AppConfig) {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.preferences.log_level.to_level_filter());
        // RUST_LOG, when set, wins over the config file.
        builder.parse_default_env();
        builder.init();
    }

    pub fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
        let config = load_config(&args)?;
        init_logging(&config);

        let workspace = Workspace::from_config(&config)?;

        if args.list {
            for project in workspace.projects().projects() {
                let marker = if project.id == workspace.projects().active_id() {
                    "*"
                } else {
                    " "
                };
                println!("{} {} {}", marker, project.id, project.name);
            }
            for exporter in workspace.exporters().all() {
                println!("{:<6} {}", exporter.id(), exporter.display_name());
            }
            return Ok(());
        }

        let project_id = match (&args.project, &args.project_name) {
            (Some(id), _) => *id,
            (None, Some(name)) => workspace
                .projects()
                .projects()
                .iter()
                .find(|p| &p.name == name)
                .map(|p| p.id)
                .ok_or_else(|| format!("No project named '{}'", name))?,
            (None, None) => workspace.projects().active_id(),
        };

        let artifact =
            workspace.export_project(project_id, &args.format, &ExportOptions::default())?;
        for warning in &artifact.warnings {
            match warning.severity {
                WarningSeverity::Info => log::info!("{}", warning.message),
                WarningSeverity::Warning => log::warn!("{}", warning.message),
            }
        }
        let path = artifact.write_to_dir(&args.output)?;
        println!(
            "Wrote {} images and {} annotations to {}",
            artifact.images_exported,
            artifact.annotations_exported,
            path.display()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    if let Err(e) = cli::run(cli::Args::parse()) {
        eprintln!("vdat-export: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {}
