use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use pz_core::Quantity;
use pz_core::registry::kilotonne;
use pz_eval::{EvalError, EvalOptions, ProjectEvaluation, impulse_response_evaluation};
use pz_sim::Ghg;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid options file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Core(#[from] pz_core::CoreError),
    #[error("no world named '{0}'")]
    UnknownWorld(String),
    #[error("world '{world}' has no series '{series}'")]
    UnknownSeries { world: String, series: String },
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "pz-cli")]
#[command(about = "Emissions policy evaluation over sparse time series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the greenhouse gases and their 100-year warming potentials
    Gases,
    /// Net-present CO2e of a one-year pulse of each gas
    Impulse {
        #[command(flatten)]
        run: RunArgs,
        /// Baseline series to export as JSON after the run
        #[arg(long)]
        export: Option<String>,
        /// Output file for --export (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export one series of one evaluated world as JSON
    ExportSeries {
        #[command(flatten)]
        run: RunArgs,
        /// World name, e.g. Baseline or StateA_Impulse_CH4
        world: String,
        /// Series name
        series: String,
        /// Output file (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Evaluation options as YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pulse size in kt CO2e
    #[arg(long, default_value_t = 1000.0)]
    impulse_kt: f64,
    /// Emissions category receiving the pulse
    #[arg(long, default_value = "Energy")]
    catpath: String,
    /// Overrides `present` from the options file
    #[arg(long)]
    present: Option<f64>,
    /// Horizon in years after `present`; overrides `t_stop`
    #[arg(long)]
    years: Option<f64>,
    /// Overrides `discount_rate` from the options file
    #[arg(long)]
    discount_rate: Option<f64>,
}

impl RunArgs {
    fn options(&self) -> CliResult<EvalOptions> {
        let mut opts = match &self.config {
            Some(path) => load_options(path)?,
            None => EvalOptions::default(),
        };
        if self.present.is_some() {
            opts.present = self.present;
        }
        if let Some(years) = self.years {
            let present = opts.present_or_now();
            opts.present = Some(present);
            opts.t_stop = present + years;
        }
        if let Some(rate) = self.discount_rate {
            opts.discount_rate = rate;
        }
        opts.validate()?;
        Ok(opts)
    }

    fn evaluate(&self) -> CliResult<(ProjectEvaluation, EvalOptions)> {
        let opts = self.options()?;
        let pulse = Quantity::new(self.impulse_kt, kilotonne());
        let mut eval = impulse_response_evaluation(pulse, &self.catpath, &opts)?;
        eval.run_until(opts.t_stop)?;
        Ok((eval, opts))
    }
}

fn load_options(path: &Path) -> CliResult<EvalOptions> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gases => cmd_gases(),
        Commands::Impulse {
            run,
            export,
            output,
        } => cmd_impulse(&run, export.as_deref(), output.as_deref()),
        Commands::ExportSeries {
            run,
            world,
            series,
            output,
        } => cmd_export_series(&run, &world, &series, output.as_deref()),
    }
}

fn cmd_gases() -> CliResult<()> {
    println!("{:<8} {:>8}", "gas", "GWP100");
    for ghg in Ghg::ALL {
        println!("{:<8} {:>8}", ghg.as_str(), ghg.gwp_100());
    }
    Ok(())
}

fn cmd_impulse(run: &RunArgs, export: Option<&str>, output: Option<&Path>) -> CliResult<()> {
    let (eval, opts) = run.evaluate()?;
    info!(present = eval.present(), "evaluated impulse response");

    let base_rate = opts.base_rate();
    println!(
        "Impulse of {} kt CO2e into '{}', present {:.2}, discount rate {}",
        run.impulse_kt,
        run.catpath,
        eval.present(),
        opts.discount_rate
    );
    println!("\n{:<16} {:>16}", "candidate", "NP CO2e [kt]");
    for (name, cmp) in eval.comparisons() {
        let co2e = cmp.net_present_co2e(base_rate)?.value_in(&kilotonne())?;
        println!("{:<16} {:>16.6}", name, co2e);
    }
    println!("\nDistinct series across worlds: {}", eval.all_sts_names().len());

    if let Some(series) = export {
        write_series(&eval, "Baseline", series, output)?;
    }
    Ok(())
}

fn cmd_export_series(
    run: &RunArgs,
    world: &str,
    series: &str,
    output: Option<&Path>,
) -> CliResult<()> {
    let (eval, _) = run.evaluate()?;
    write_series(&eval, world, series, output)
}

fn write_series(
    eval: &ProjectEvaluation,
    world: &str,
    series: &str,
    output: Option<&Path>,
) -> CliResult<()> {
    let state = eval
        .states()
        .find(|s| s.name() == world)
        .ok_or_else(|| CliError::UnknownWorld(world.to_string()))?;
    let sts = state
        .get_sts(series)
        .ok_or_else(|| CliError::UnknownSeries {
            world: world.to_string(),
            series: series.to_string(),
        })?;
    let json = serde_json::to_string_pretty(sts)?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("✓ Exported {} samples to {}", sts.len(), path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}
