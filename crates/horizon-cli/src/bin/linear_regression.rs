//! horizon-linear-regression — the default algorithm behind Linear models.
//!
//! Reads `{"lookAhead": ms, "evaluations": [...]}` from stdin and prints the
//! predicted replica count.

use std::io::Read;

use anyhow::Context;
use horizon_predict::RegressionParameters;
use horizon_predict::regression::predict;

fn main() -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading regression parameters from stdin")?;

    let params: RegressionParameters =
        serde_json::from_str(&input).context("parsing regression parameters")?;
    println!("{}", predict(&params)?);
    Ok(())
}
