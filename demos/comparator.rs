use std::path::PathBuf;
use std::time::Instant;

use bdd_sampler::aig::{AndGate, Circuit, Literal};
use bdd_sampler::bdd::{Bdd, BddConfig};
use bdd_sampler::compile::compile;
use bdd_sampler::count::PathCounter;
use bdd_sampler::encode::AssignmentEncoder;
use bdd_sampler::sample::Sampler;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(author, version, about = "Sample solutions of an AIGER circuit uniformly")]
struct Cli {
    /// ASCII AIGER file; an equality comparator is generated if omitted
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Bits per operand of the generated comparator
    #[arg(short, long, default_value_t = 8)]
    bits: u32,

    /// Field widths used to group input bits (defaults to one field per comparator operand)
    #[arg(short, long, value_delimiter = ',')]
    widths: Vec<usize>,

    /// Number of samples to draw
    #[arg(short = 'n', long, default_value_t = 10)]
    samples: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Disable dynamic reordering
    #[arg(long)]
    no_reorder: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log: simplelog::LevelFilter,
}

/// `a == b` over two `bits`-wide operands, with all bits of `a` declared first.
fn comparator(bits: u32) -> Circuit {
    let a = |i: u32| Literal::from_index(i + 1, false);
    let b = |i: u32| Literal::from_index(bits + i + 1, false);
    let inputs = (0..bits).map(a).chain((0..bits).map(b)).collect();

    let mut next = 2 * bits + 1;
    let mut fresh = || {
        next += 1;
        Literal::from_index(next - 1, false)
    };

    let mut gates = Vec::new();
    let mut acc = Literal::TRUE;
    for i in 0..bits {
        let p = fresh();
        let q = fresh();
        let eq = fresh();
        let conj = fresh();
        gates.push(AndGate::new(p, a(i), !b(i)));
        gates.push(AndGate::new(q, !a(i), b(i)));
        gates.push(AndGate::new(eq, !p, !q));
        gates.push(AndGate::new(conj, acc, eq));
        acc = conj;
    }
    Circuit::new(inputs, gates, acc)
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        cli.log,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let (circuit, default_widths) = match &cli.input {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let circuit = Circuit::from_aag(&text)?;
            let n = circuit.num_inputs();
            (circuit, vec![n])
        }
        None => (comparator(cli.bits), vec![cli.bits as usize; 2]),
    };
    let widths = if cli.widths.is_empty() { default_widths } else { cli.widths.clone() };
    let encoder = AssignmentEncoder::from_widths(&widths);
    if encoder.total_width() > circuit.num_inputs() {
        return Err(eyre!(
            "fields need {} bits but the circuit has {} inputs",
            encoder.total_width(),
            circuit.num_inputs()
        ));
    }

    let config = BddConfig::default()
        .with_auto_reorder(!cli.no_reorder)
        .with_reorder_on_finish(!cli.no_reorder);
    let bdd = Bdd::with_config(config);

    let time_compile = Instant::now();
    let compiled = compile(&bdd, &circuit)?;
    println!(
        "Compiled {} inputs and {} gates into {} nodes in {:.3} s",
        circuit.num_inputs(),
        circuit.gates.len(),
        bdd.node_count(&[compiled.output]),
        time_compile.elapsed().as_secs_f64()
    );
    println!("{}", bdd.debug_ordering());

    let counts = PathCounter::new(&bdd, compiled.output);
    println!("Satisfying assignments: {}", counts.satisfying());

    let sampler = Sampler::new(&bdd, &counts)?;
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    for (i, assignment) in sampler.sample_many(cli.samples, &mut rng)?.iter().enumerate() {
        let fields = encoder.encode_assignment(assignment, &compiled.inputs)?;
        let values: Vec<String> = fields.iter().map(|f| format!("{}={}", f.name, f.to_hex())).collect();
        println!("#{:<4} {}", i, values.join(" "));
    }

    compiled.release(&bdd);
    Ok(())
}
