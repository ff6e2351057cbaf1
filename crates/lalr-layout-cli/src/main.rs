use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lalr_layout::{grammar::examples, ContextSets, Grammar};
use std::{fmt::Write as _, fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The reference grammar to annotate.
    #[arg(long, value_enum, default_value_t = Example::Arithmetic)]
    grammar: Example,

    /// Also dump the LR(0) automaton.
    #[arg(long)]
    automaton: bool,

    /// Specify the path of the dump file. The dump is written to stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum Example {
    Expression,
    Arithmetic,
    WithNullable,
    NullableTail,
    Composed,
    Fig1,
    Fig5,
    Fig6,
}

impl Example {
    fn name(self) -> &'static str {
        match self {
            Self::Expression => "expression",
            Self::Arithmetic => "arithmetic",
            Self::WithNullable => "with_nullable",
            Self::NullableTail => "nullable_tail",
            Self::Composed => "composed",
            Self::Fig1 => "fig1",
            Self::Fig5 => "fig5",
            Self::Fig6 => "fig6",
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    let name = args.grammar.name();
    let dump = process(&args)
        .with_context(|| anyhow::anyhow!("errored during processing `{}'", name))?;

    match &args.output {
        Some(out_file) => fs::write(out_file, dump).with_context(|| {
            anyhow::anyhow!("failed to write the dump to {}", out_file.display())
        })?,
        None => print!("{}", dump),
    }

    Ok(())
}

fn process(args: &Args) -> anyhow::Result<String> {
    let name = args.grammar.name();
    let (_, example) = examples::ALL
        .iter()
        .find(|(n, _)| *n == name)
        .with_context(|| anyhow::anyhow!("missing reference grammar `{}'", name))?;

    let s = Instant::now();
    let grammar = Grammar::define(*example).context("failed to define the grammar")?;
    let ctx = ContextSets::new(&grammar);
    tracing::info!("context sets: {:?} elapsed", s.elapsed());

    let s = Instant::now();
    let lr0 = lalr_layout::lr0(&grammar);
    tracing::info!("LR(0) automaton: {:?} elapsed", s.elapsed());

    let s = Instant::now();
    let sets = lalr_layout::build(&grammar, &ctx, &lr0);
    tracing::info!("look-ahead and layout sets: {:?} elapsed", s.elapsed());

    let mut dump = String::new();
    writeln!(dump, "{}", grammar)?;
    if args.automaton {
        writeln!(dump, "{}", lr0.display(&grammar))?;
    }
    write!(dump, "{}", sets.display(&grammar, &lr0))?;
    Ok(dump)
}
