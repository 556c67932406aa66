//! Monte Carlo estimates of a fair die's face probabilities.
//!
//! Run with `cargo run --example dice_estimates`.

use ndgrad::Tensor;
use ndgrad::probability::{Multinomial, relative_frequencies, running_estimates};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;

const FACES: usize = 6;
const GROUPS: usize = 500;

fn main() -> Result<(), Box<dyn Error>> {
    let fair_probs = Tensor::full(&[FACES], 1.0 / FACES as f64);
    println!("fair_probs = {:?}", fair_probs.data());

    let mut rng = StdRng::seed_from_u64(2024);

    let one_roll = Multinomial::new(1, &fair_probs)?.sample(&mut rng);
    println!("1 roll     = {:?}", one_roll.data());

    let ten_rolls = Multinomial::new(10, &fair_probs)?.sample(&mut rng);
    println!("10 rolls   = {:?}", ten_rolls.data());

    let counts = Multinomial::new(1000, &fair_probs)?.sample(&mut rng);
    println!("1000 rolls = {:?}", relative_frequencies(&counts).data());

    let counts = Multinomial::new(10, &fair_probs)?.sample_n(GROUPS, &mut rng);
    let estimates = running_estimates(&counts)?;

    println!();
    println!("Running estimates of P(die = face) after each group of 10 rolls");
    print!("{:>6}", "group");
    for face in 1..=FACES {
        print!("{:>9}", format!("P({face})"));
    }
    println!();

    for group in [0, 1, 4, 9, 24, 49, 99, 249, GROUPS - 1] {
        print!("{:>6}", group + 1);
        for face in 0..FACES {
            let p = estimates.get(&[group, face]).ok_or("estimate out of range")?;
            print!("{p:>9.4}");
        }
        println!();
    }
    println!("{:>6}{:>9.4}", "true", 1.0 / FACES as f64);

    Ok(())
}
