/*
 * RecoFactors
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;

use anyhow::{anyhow, Context};
use getopts::Options;

use recofactors::evaluate;
use recofactors::io;
use recofactors::logging;
use recofactors::{AnyModel, FitOptions, Model, Params};

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Training file name (required). The input consists of \
        interactions between users and items. The input file must contain a user, item and \
        value triple per line, separated by tabs.", "PATH");
    opts.optopt("t", "testfile", "Test file name (optional) in the same format as the input, \
        used to report the error on held-out interactions.", "PATH");
    opts.optopt("m", "model", "Model to train: svd, nmf, svdpp or wrmf (optional, defaults to \
        svd).", "NAME");
    opts.optopt("p", "params", "Model parameters as a JSON object, or a path to a file \
        containing one, e.g. '{\"nFactors\": 50, \"target\": \"bpr\"}' (optional).", "JSON");
    opts.optopt("o", "outputfile", "Write predictions for the test (or training) interactions \
        as JSON lines to this file, use '-' for stdout (optional).", "PATH");
    opts.optopt("j", "jobs", "Number of workers for the parallel sections (optional, defaults to \
        the number of CPUs).", "NUMBER");
    opts.optflagmulti("v", "verbose", "Increase log verbosity");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let train_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let n_jobs: usize = match matches.opt_get_default("j", num_cpus::get()) {
        Ok(n_jobs) => n_jobs,
        Err(failure) => {
            let hint = format!("Problem with option 'j': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let verbosity = matches.opt_count("v") as u32;
    if let Err(error) = logging::init(verbosity + 1) {
        eprintln!("Failed to initialize logging: {}", error);
    }

    let task = Task {
        train_path,
        test_path: matches.opt_str("t"),
        model: matches.opt_str("m").unwrap_or_else(|| String::from("svd")),
        params: matches.opt_str("p"),
        predictions_path: matches.opt_str("o"),
        n_jobs,
        verbose: verbosity > 0,
    };

    if let Err(error) = train(task) {
        eprintln!("Error: {:#}", error);
        std::process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

struct Task {
    train_path: String,
    test_path: Option<String>,
    model: String,
    params: Option<String>,
    predictions_path: Option<String>,
    n_jobs: usize,
    verbose: bool,
}

fn read_params(params: Option<&str>) -> anyhow::Result<Params> {
    let json = match params {
        None => return Ok(Params::new()),
        Some(params) if params.trim_start().starts_with('{') => params.to_owned(),
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read the parameters from {}", path))?,
    };
    Params::from_json(&json).context("failed to parse the parameters")
}

fn train(task: Task) -> anyhow::Result<()> {

    let params = read_params(task.params.as_deref())?;
    let mut model = AnyModel::new(&task.model, params)?;

    println!("Reading {} to build the training set", task.train_path);
    let train_set = io::read_data_set(&task.train_path)
        .with_context(|| format!("failed to read {}", task.train_path))?;

    if train_set.is_empty() {
        return Err(anyhow!("{} contains no interactions", task.train_path));
    }

    println!(
        "Found {} interactions between {} users and {} items.",
        train_set.len(),
        train_set.user_count(),
        train_set.item_count(),
    );

    let options = FitOptions::default()
        .with_n_jobs(task.n_jobs)
        .with_verbose(task.verbose);
    model.fit(&train_set, &options)?;

    let train_error = evaluate::errors(&model, &train_set);
    println!("Training RMSE {:.6}, MAE {:.6}", train_error.rmse(), train_error.mae());

    let evaluation_set = match &task.test_path {
        Some(test_path) => {
            let test_set = io::read_data_set(test_path)
                .with_context(|| format!("failed to read {}", test_path))?;
            let test_error = evaluate::errors(&model, &test_set);
            println!("Test RMSE {:.6}, MAE {:.6}", test_error.rmse(), test_error.mae());
            test_set
        },
        None => train_set,
    };

    if let Some(predictions_path) = task.predictions_path {
        let predictions_path = if predictions_path == "-" { None } else { Some(predictions_path) };
        io::write_predictions(&model, &evaluation_set, predictions_path)?;
    }

    Ok(())
}
