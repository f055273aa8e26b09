use jscrush::{CrushHeuristic, PackerData, PackerOptions, Strategy};

use crate::{
    input_output::{InputArgs, OutputArgs},
    LogArgs,
};

/// Which strategy (or strategies) to run for the `pack` command.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StrategyArg {
    /// The single-pass greedy crusher.
    Crusher,
    /// The look-ahead beam search.
    Beam,
    /// The digit-token variant.
    Digit,
    /// Run all three and report the smallest artefact.
    All,
}

/// Crusher heuristic selection, mirrored from [`CrushHeuristic`].
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum HeuristicArg {
    Balanced,
    MostCopies,
    Longest,
    Density,
    Adaptive,
    AdaptiveGain,
}

impl From<HeuristicArg> for CrushHeuristic {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Balanced => CrushHeuristic::Balanced,
            HeuristicArg::MostCopies => CrushHeuristic::MostCopies,
            HeuristicArg::Longest => CrushHeuristic::Longest,
            HeuristicArg::Density => CrushHeuristic::Density,
            HeuristicArg::Adaptive => CrushHeuristic::Adaptive,
            HeuristicArg::AdaptiveGain => CrushHeuristic::AdaptiveGain,
        }
    }
}

/// Compress an input program into a self-extracting artefact.
#[derive(clap::Args, Debug)]
pub struct PackArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Which search strategy to run.
    #[arg(long, value_enum, default_value = "crusher")]
    strategy: StrategyArg,

    /// Crusher heuristic (ignored for `beam`/`digit`).
    #[arg(long, value_enum, default_value = "balanced")]
    heuristic: HeuristicArg,

    /// Beam width.
    #[arg(long, default_value_t = PackerOptions::default().beam_width)]
    beam_width: usize,

    /// Branch factor: top-B children expanded per beam state.
    #[arg(long, default_value_t = PackerOptions::default().branch_factor)]
    branch_factor: usize,

    /// Maximum number of replacements to bind.
    #[arg(long, default_value_t = PackerOptions::default().max_replacements)]
    max_replacements: usize,

    /// Gain-predictor look-ahead depth.
    #[arg(long, default_value_t = PackerOptions::default().look_ahead_depth)]
    look_ahead_depth: u32,

    /// Per-step discount applied by the gain predictor.
    #[arg(long, default_value_t = PackerOptions::default().look_ahead_discount)]
    look_ahead_discount: f64,

    /// Sort the beam by cumulative gain instead of predicted score.
    #[arg(long)]
    prioritize_highest_gain: bool,

    /// Digit-variant token count, in `1..=100`.
    #[arg(long, default_value_t = PackerOptions::default().max_int)]
    max_int: u32,

    /// Digit-worker state-count budget.
    #[arg(long, default_value_t = PackerOptions::default().max_states)]
    max_states: u64,

    /// Digit-worker wall-clock budget in milliseconds.
    #[arg(long, default_value_t = PackerOptions::default().time_limit_ms)]
    time_limit_ms: u64,

    /// Print the textual details report in addition to the artefact.
    #[arg(long)]
    report: bool,
}

impl PackArgs {
    /// Run the `pack` command.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let input = self.input.read_to_string()?;
        let options = self.to_options();

        let strategies = self.strategies_to_run();
        log::info!("packing {} bytes with {:?}", input.len(), strategies);
        let results = jscrush::pack(&input, &options, &strategies);

        let best = results
            .iter()
            .filter(|data| data.result[1].length >= 0)
            .min_by_key(|data| data.result[1].length)
            .or_else(|| results.first())
            .ok_or("no strategy produced a result")?;

        self.write_result(best)
    }

    fn to_options(&self) -> PackerOptions {
        PackerOptions::default()
            .with_beam_width(self.beam_width)
            .with_branch_factor(self.branch_factor)
            .with_max_replacements(self.max_replacements)
            .with_look_ahead_depth(self.look_ahead_depth)
            .with_look_ahead_discount(self.look_ahead_discount)
            .with_prioritize_highest_gain(self.prioritize_highest_gain)
            .with_heuristic(self.heuristic.into())
            .with_max_int(self.max_int)
            .with_max_states(self.max_states)
            .with_time_limit_ms(self.time_limit_ms)
    }

    fn strategies_to_run(&self) -> Vec<Strategy> {
        match self.strategy {
            StrategyArg::Crusher => vec![Strategy::Crusher],
            StrategyArg::Beam => vec![Strategy::Beam],
            StrategyArg::Digit => vec![Strategy::Digit],
            StrategyArg::All => vec![Strategy::Crusher, Strategy::Beam, Strategy::Digit],
        }
    }

    fn write_result(
        &self,
        data: &PackerData,
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::io::Write;
        let mut writer = self.output.open_writer()?;
        let final_stage = &data.result[1];

        if final_stage.length < 0 {
            writeln!(writer, "// {} (strategy: {})", final_stage.details, data.strategy.name())?;
            return Ok(());
        }

        writeln!(writer, "{}", final_stage.output)?;
        if self.report {
            writeln!(
                writer,
                "// strategy={} replacements={} length={} {}",
                data.strategy.name(),
                data.replacements.len(),
                final_stage.length,
                final_stage.details,
            )?;
        }
        Ok(())
    }
}
