use anyhow::Result;
use clap::{Parser, ValueEnum};
use posecam::{
    CameraBackend, DemoLoader, FacingMode, LandmarkerLoader, MockCameraBackend, PosecamApp,
    PosecamConfig, TemplateStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    /// Synthetic cameras and a scripted pose model
    Demo,
    /// V4L2 cameras through GStreamer
    Gstreamer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for FacingMode {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => FacingMode::Front,
            FacingArg::Back => FacingMode::Back,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "posecam")]
#[command(about = "Live camera pose alignment: match a reference silhouette, then take the photo")]
#[command(version)]
#[command(long_about = "Shows a reference pose silhouette over the live camera, tracks the \
subject's body with a pose model and lights the outline up once the subject matches it. \
Photos are exported as JPEG files, mirrored like the preview when using the front camera.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "posecam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// List the built-in pose templates and exit
    #[arg(long, help = "List built-in pose templates and exit")]
    list_templates: bool,

    /// Template shown at startup
    #[arg(long, value_name = "ID", help = "Select a pose template by id at startup")]
    template: Option<String>,

    /// Camera used at startup
    #[arg(long, value_enum, help = "Camera to open at startup")]
    facing: Option<FacingArg>,

    /// Camera and pose model backend
    #[arg(long, value_enum, default_value = "demo", help = "Camera backend")]
    backend: BackendArg,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    if args.list_templates {
        list_templates();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting posecam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match PosecamConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Some(facing) = args.facing {
        config.camera.facing = facing.into();
    }

    let (backend, loader) = create_backends(args.backend, &config)?;

    let mut app = PosecamApp::new(config, backend, loader).map_err(|e| {
        error!("Failed to create application: {}", e);
        e
    })?;

    app.initialize().map_err(|e| {
        error!("Failed to initialize: {}", e);
        e
    })?;

    if let Some(template) = &args.template {
        app.select_template_by_id(template).await?;
    }

    app.start().await.map_err(|e| {
        error!("Failed to start: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("Posecam exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn create_backends(
    backend: BackendArg,
    config: &PosecamConfig,
) -> Result<(Arc<dyn CameraBackend>, Arc<dyn LandmarkerLoader>)> {
    let loader: Arc<dyn LandmarkerLoader> = Arc::new(DemoLoader::new(Duration::from_millis(300)));

    match backend {
        BackendArg::Demo => {
            let (width, height) = config.camera.resolution;
            let camera = MockCameraBackend::new().with_native_resolution(width, height);
            Ok((Arc::new(camera), loader))
        }
        #[cfg(all(feature = "gstreamer", target_os = "linux"))]
        BackendArg::Gstreamer => {
            let camera = posecam::camera::GstCameraBackend::new(&config.camera)?;
            Ok((Arc::new(camera), loader))
        }
        #[cfg(not(all(feature = "gstreamer", target_os = "linux")))]
        BackendArg::Gstreamer => {
            anyhow::bail!("posecam was built without the `gstreamer` feature")
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("posecam={}", log_level)));

    // Compact by default, multi-line output breaks up in raw mode
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some("compact") | None => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().compact().with_target(false).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Posecam Configuration File");
    println!("# Default configuration with all available options");
    println!("# Every key can be overridden with POSECAM_<SECTION>__<KEY> environment variables");
    println!();
    println!("{}", PosecamConfig::default().to_toml()?);
    Ok(())
}

fn list_templates() {
    let store = TemplateStore::builtin();
    for (position, template) in store.all().iter().enumerate() {
        println!(
            "{}  {:<18} {} ({} reference joints)",
            position + 1,
            template.id,
            template.name,
            template.reference_landmarks.len()
        );
    }
}
