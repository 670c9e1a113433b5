use anyhow::Result;
use clap::Parser;
use localpkg::commands;
use localpkg::config::ConfigUpdate;
use localpkg::runtime::{RealRuntime, RealShell};
use localpkg::scripts::{ScriptRequest, ScriptSelection};
use std::path::PathBuf;

/// Dependencies stay quiet unless RUST_LOG asks for them.
const DEFAULT_LOG_FILTER: &str = "localpkg=info";

/// localpkg - local npm package distribution
///
/// Builds the npm package in the current directory and copies it into every
/// project of the workspace that depends on it, or installs a package from
/// the workspace into the current project.
///
/// Examples:
///   localpkg init ~/work                # Use ~/work as the workspace root
///   localpkg copy --build               # Run the configured build, then distribute
///   localpkg copy -c="tsc -b" --watch   # Compile and distribute on every change
///   localpkg install @acme/ui           # Install @acme/ui from the workspace
#[derive(Parser, Debug)]
#[command(author, version = env!("LOCALPKG_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.localpkg-config.json; also via LOCALPKG_CONFIG)
    #[arg(long = "config", env = "LOCALPKG_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create the config with the workspace root directory
    Init(InitArgs),

    /// Change values of an existing config
    SetConfig(SetConfigArgs),

    /// Print the current config
    GetConfig,

    /// Build the current package and copy it into every workspace project using it
    Copy(CopyArgs),

    /// Build a workspace package and install it into the current project
    Install(InstallArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Workspace root under which all projects live
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub scripts: ScriptConfigArgs,
}

#[derive(clap::Args, Debug)]
pub struct SetConfigArgs {
    /// Workspace root under which all projects live
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    #[command(flatten)]
    pub scripts: ScriptConfigArgs,
}

#[derive(clap::Args, Debug)]
pub struct ScriptConfigArgs {
    /// Command used by `--compile`
    #[arg(long, value_name = "CMD")]
    pub compile_script: Option<String>,

    /// Command used by `--build`
    #[arg(long, value_name = "CMD")]
    pub build_script: Option<String>,

    /// Command used by `--custom`
    #[arg(long, value_name = "CMD")]
    pub custom_script: Option<String>,
}

impl ScriptConfigArgs {
    fn into_update(self, dir: Option<PathBuf>) -> ConfigUpdate {
        ConfigUpdate {
            dir,
            compile_script: self.compile_script,
            build_script: self.build_script,
            custom_script: self.custom_script,
        }
    }
}

/// Scripts to run before packing. A flag without a value runs the configured
/// script; `--flag=<CMD>` runs CMD instead.
#[derive(clap::Args, Debug)]
pub struct ScriptArgs {
    /// Run the compile script
    #[arg(short, long, value_name = "CMD", num_args = 0..=1, require_equals = true)]
    pub compile: Option<Option<String>>,

    /// Run the build script
    #[arg(short, long, value_name = "CMD", num_args = 0..=1, require_equals = true)]
    pub build: Option<Option<String>>,

    /// Run the custom script
    #[arg(long, value_name = "CMD", num_args = 0..=1, require_equals = true)]
    pub custom: Option<Option<String>>,
}

impl From<ScriptArgs> for ScriptSelection {
    fn from(args: ScriptArgs) -> Self {
        ScriptSelection {
            custom: ScriptRequest::from_flag(args.custom),
            build: ScriptRequest::from_flag(args.build),
            compile: ScriptRequest::from_flag(args.compile),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct CopyArgs {
    #[command(flatten)]
    pub scripts: ScriptArgs,

    /// Re-run on every change below PATH (defaults to the current directory)
    #[arg(short, long, value_name = "PATH", num_args = 0..=1, require_equals = true)]
    pub watch: Option<Option<PathBuf>>,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Name of the package, as declared in its package.json
    #[arg(value_name = "PACKAGE")]
    pub package: String,

    #[command(flatten)]
    pub scripts: ScriptArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER),
    )
        .format_timestamp(None)
        .init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Init(args) => {
            commands::init(
                runtime,
                RealShell,
                cli.config,
                args.dir,
                args.scripts.into_update(None),
            )
            .await?
        }
        Commands::SetConfig(args) => {
            commands::set_config(runtime, cli.config, args.scripts.into_update(args.dir)).await?
        }
        Commands::GetConfig => commands::get_config(runtime, cli.config).await?,
        Commands::Copy(args) => {
            commands::copy(
                runtime,
                RealShell,
                cli.config,
                args.scripts.into(),
                args.watch,
            )
            .await?
        }
        Commands::Install(args) => {
            commands::install(
                runtime,
                RealShell,
                cli.config,
                &args.package,
                args.scripts.into(),
            )
            .await?
        }
    }
    Ok(())
}
