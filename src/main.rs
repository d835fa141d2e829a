#[macro_use]
extern crate clap;
use clap::Arg;
use colored::*;
use console::style;

use hwbmc::bmc::{BmcEngine, RunOutcome};
use hwbmc::environment::{self, Environment};
use hwbmc::error::Result;
use hwbmc::model::ModelIR;
use hwbmc::solver::create_solver;
use hwbmc::stimulus;
use hwbmc::synth;
use hwbmc::util::DumpToFile;
use hwbmc::validate::Validate;
use std::path::Path;
use std::process;

fn main() {
    let arguments = parse_arguments();
    match run(&arguments) {
        Ok(code) => process::exit(code),
        Err(e) => {
            println!("{}", style(&e).bold().red());
            if let Some(backtrace) = e.backtrace() {
                println!("{:?}", backtrace);
            }
            process::exit(4);
        }
    }
}

struct Arguments {
    design_file: String,
    top_module: String,
    stimulus_file: String,
    k_max: Option<usize>,
    environment_file: Option<String>,
    solver: Option<environment::Solver>,
    synth_command: Option<String>,
    debug: bool,
    skip_solving: bool,
    lir_file: Option<String>,
    smt_file: Option<String>,
}

fn parse_arguments() -> Arguments {
    fn is_positive_number(s: String) -> std::result::Result<(), String> {
        if s.parse::<usize>().map(|v| v > 0).unwrap_or(false) {
            Ok(())
        } else {
            Err(format!("{} isn't a positive number", s))
        }
    }

    let matches = app_from_crate!()
        .arg(
            Arg::with_name("design_file")
                .value_name("design.hdl")
                .help("Design file; already-BTOR2 (.btor2/.btor) or synthesizable via --synth-cmd")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("top_module")
                .value_name("top_module")
                .help("Top-level module name passed to the synthesis adapter")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("stimulus_file")
                .value_name("stimulus.txt")
                .help("Stimulus/property script")
                .required(true)
                .index(3),
        )
        .arg(
            Arg::with_name("k_max")
                .short("k")
                .value_name("K_max")
                .help("Maximum unroll depth")
                .validator(is_positive_number)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("environment_file")
                .short("e")
                .long("env")
                .value_name("FILE")
                .help("Sets environment file to use (arguments overwrite it)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("solver")
                .long("solver")
                .value_name("SOLVER")
                .possible_values(&["z3", "cvc4", "yices2"])
                .help("Sets solver to use")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("synth_command")
                .long("synth-cmd")
                .value_name("TEMPLATE")
                .help("Command template (with {input}/{top}/{output}) to synthesize non-BTOR2 input")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Enables debug mode"),
        )
        .arg(
            Arg::with_name("skip_solving")
                .long("skip-solving")
                .help("Parses and binds the model without invoking the solver"),
        )
        .arg(
            Arg::with_name("lir_file")
                .long("dump-lir")
                .value_name("FILE")
                .help("Prints the unrolled LIR program into the file (plain text)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("smt_file")
                .long("dump-smt")
                .value_name("FILE")
                .help("Prints the SMT-2 formula into the file (plain text)")
                .takes_value(true),
        )
        .get_matches();

    let parse_solver = |solver: &str| match solver {
        "z3" => environment::Solver::Z3,
        "cvc4" => environment::Solver::Cvc4,
        "yices2" => environment::Solver::Yices2,
        _ => panic!("unknown solver"),
    };

    Arguments {
        design_file: matches.value_of("design_file").unwrap().to_string(),
        top_module: matches.value_of("top_module").unwrap().to_string(),
        stimulus_file: matches.value_of("stimulus_file").unwrap().to_string(),
        k_max: matches.value_of("k_max").map(|v| v.parse().unwrap()),
        environment_file: matches.value_of("environment_file").map(String::from),
        solver: matches.value_of("solver").map(parse_solver),
        synth_command: matches.value_of("synth_command").map(String::from),
        debug: matches.is_present("debug"),
        skip_solving: matches.is_present("skip_solving"),
        lir_file: matches.value_of("lir_file").map(String::from),
        smt_file: matches.value_of("smt_file").map(String::from),
    }
}

fn build_environment(arguments: &Arguments) -> Result<Environment> {
    let mut env = if let Some(file_path) = &arguments.environment_file {
        Environment::from_file(Path::new(file_path))?
    } else {
        let input_file = Path::new(&arguments.design_file);
        let env_file = input_file.with_extension("yaml");
        match Environment::from_file(&env_file) {
            Ok(env) => {
                println!(
                    "Using environment defined in '{}'.",
                    style(&env_file.to_str().unwrap()).yellow()
                );
                env
            }
            Err(_) => {
                println!("Using default environment.");
                Environment::default()
            }
        }
    };

    if let Some(solver) = arguments.solver {
        env.solver = solver;
    }
    if let Some(k_max) = arguments.k_max {
        env.k_max = k_max;
    }
    if arguments.debug {
        env.debug = true;
    }
    if arguments.skip_solving {
        env.skip_solving = true;
    }

    Ok(env)
}

/// Runs the full pipeline and returns the process exit code (§6).
fn run(arguments: &Arguments) -> Result<i32> {
    let env = build_environment(arguments)?;

    if env.debug {
        println!("{}:\n{}\n---", "Environment".bold(), style(&env).cyan());
    }

    println!(
        "{} Load design '{}'",
        style("[1/5]").bold().dim(),
        arguments.design_file.yellow()
    );
    let design_path = Path::new(&arguments.design_file);
    let synth_command = arguments
        .synth_command
        .as_deref()
        .map(synth::SynthCommand::new);
    let source = match synth::ensure_btor2(design_path, &arguments.top_module, synth_command.as_ref()) {
        Ok(source) => source,
        Err(e) => {
            println!("{}", style(&e).bold().red());
            return Ok(3);
        }
    };

    println!("{} Parse BTOR2 model", style("[2/5]").bold().dim());
    let model = match hwbmc::btor2::parse(&source) {
        Ok(model) => model,
        Err(e) => {
            println!("{}", style(&e).bold().red());
            return Ok(3);
        }
    };
    if let Err(e) = model.validate() {
        println!("{}", style(&e).bold().red());
        return Ok(3);
    }

    println!(
        "{} Parse stimulus script '{}'",
        style("[3/5]").bold().dim(),
        arguments.stimulus_file.yellow()
    );
    let stimulus_source = std::fs::read_to_string(&arguments.stimulus_file)?;
    let stimulus = match stimulus::parse(&stimulus_source) {
        Ok(stimulus) => stimulus,
        Err(e) => {
            println!("{}", style(&e).bold().red());
            return Ok(3);
        }
    };
    if let Err(e) = stimulus
        .validate()
        .and_then(|_| stimulus::bind(&stimulus, &model))
    {
        println!("{}", style(&e).bold().red());
        return Ok(3);
    }

    if let Some(path) = &arguments.lir_file {
        dump_lir(&model, Path::new(path))?;
    }

    if env.skip_solving {
        println!(
            "{} Skipping solving (--skip-solving).",
            style("[4/5]").bold().dim()
        );
        return Ok(2);
    }

    println!(
        "{} Unroll and check (solver={}, K_max={})",
        style("[4/5]").bold().dim(),
        env.solver,
        env.k_max
    );
    let mut solver = create_solver(&env)?;
    if let Some(path) = &arguments.smt_file {
        solver.dump_formula_to_file(Path::new(path))?;
    }

    let mut engine = BmcEngine::new(&model, &stimulus, solver, env.k_max);
    let outcome = engine.run(&|| false)?;

    println!("{} Report", style("[5/5]").bold().dim());
    match outcome {
        RunOutcome::PropertyHit(cex) => {
            println!("{}", style(cex.to_string()).bold().green());
            Ok(0)
        }
        RunOutcome::BoundExhausted { k_max } => {
            println!(
                "{}",
                format!(
                    "Bound exhausted after {} steps; property not observed.",
                    k_max
                )
                .bold()
                .yellow()
            );
            Ok(1)
        }
        RunOutcome::Inconclusive { step } => {
            println!(
                "{}",
                format!("Inconclusive (solver returned UNKNOWN at step {}).", step)
                    .bold()
                    .red()
            );
            Ok(2)
        }
        RunOutcome::Cancelled => {
            println!("{}", "Cancelled.".bold().yellow());
            Ok(2)
        }
    }
}

fn dump_lir(model: &ModelIR, path: &Path) -> Result<()> {
    let mut program = hwbmc::lir::Program::new();
    program.comment(format!(
        "{} states, {} inputs",
        model.states().len(),
        model.inputs().len()
    ));
    for state in model.states() {
        program.comment(format!("state {}: next = {}", state.name(), state.next_expr()));
    }
    program.dump_to_file(path)
}
