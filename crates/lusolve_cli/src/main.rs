//! Text harness over `lusolve_core`: reads a matrix, inverts it or solves
//! against a right-hand side, and writes the result in the same format.
//!
//! Input format: first line `n`, then `n` rows of `n` whitespace-separated
//! doubles. For `solve`, one further line of `n` doubles follows as the
//! right-hand side. Exit codes: 1 usage, 2 parse/I-O failure, 3 numeric
//! failure (singular matrix).

use std::fs;
use std::io::Read;
use std::{env, io};

use anyhow::{Context, Result, bail};
use lusolve_core::{FactorConfig, LuError, Matrix, MatrixColMajor, factor, invert, solve};

fn main() {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let (command, path) = match args.as_slice() {
        [cmd] => (cmd.as_str(), None),
        [cmd, path] => (cmd.as_str(), Some(path.as_str())),
        _ => {
            eprintln!("Usage: lusolve_cli <invert|solve> [FILE]");
            eprintln!("Reads from stdin when FILE is absent.");
            std::process::exit(1);
        }
    };

    let result = match command {
        "invert" => run_invert(path),
        "solve" => run_solve(path),
        other => {
            eprintln!("Unknown command {other:?}; expected `invert` or `solve`.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("lusolve: {e:#}");
        let code = if e.downcast_ref::<LuError>().is_some() {
            3
        } else {
            2
        };
        std::process::exit(code);
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn run_invert(path: Option<&str>) -> Result<()> {
    let text = read_input(path)?;
    let (a, rest) = parse_matrix(&text)?;
    if rest.clone().next().is_some() {
        bail!("trailing input after the matrix");
    }
    let mut ainv = MatrixColMajor::new(a.size())?;
    invert(&a, &mut ainv, &FactorConfig::default())?;
    print!("{}", render(a.size(), &ainv));
    Ok(())
}

fn run_solve(path: Option<&str>) -> Result<()> {
    let text = read_input(path)?;
    let (a, mut rest) = parse_matrix(&text)?;
    let n = a.size();
    let mut b = Vec::with_capacity(n);
    for i in 0..n {
        b.push(parse_value(rest.next(), "b", i, 0)?);
    }
    if rest.next().is_some() {
        bail!("trailing input after the right-hand side");
    }

    let factors = factor(&a, &FactorConfig::default())?;
    let mut x = vec![0.0; n];
    solve(&factors, &b, &mut x)?;

    let mut out = String::new();
    for (i, v) in x.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&v.to_string());
    }
    out.push('\n');
    print!("{out}");
    Ok(())
}

fn parse_value(token: Option<&str>, what: &str, i: usize, j: usize) -> Result<f64> {
    let token = token.with_context(|| format!("missing {what}({i}, {j})"))?;
    token
        .parse::<f64>()
        .with_context(|| format!("invalid {what}({i}, {j}): {token:?}"))
}

/// Parse `n` and the following `n × n` values; returns the matrix and the
/// iterator over any remaining tokens.
fn parse_matrix(text: &str) -> Result<(Matrix, std::str::SplitWhitespace<'_>)> {
    let mut tokens = text.split_whitespace();
    let n_token = tokens.next().context("missing matrix size")?;
    let n: usize = n_token
        .parse()
        .with_context(|| format!("invalid matrix size: {n_token:?}"))?;
    let mut m = Matrix::new(n).context("bad matrix size")?;
    for i in 0..n {
        for j in 0..n {
            *m.at_mut(i, j) = parse_value(tokens.next(), "a", i, j)?;
        }
    }
    Ok((m, tokens))
}

fn render(n: usize, m: &MatrixColMajor) -> String {
    format!("{n}\n{m}")
}
