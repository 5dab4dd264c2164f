//! Serialization of options and progress reports.
//!
//! Needs the `serde` feature: `cargo test --features serde`.

#![cfg(feature = "serde")]

use gaopt::{
    breeding::Replacement,
    error::Result,
    evaluation::EvaluationPolicy,
    evolution::{EvolutionOptions, GaBuilder, GenerationReport},
    genome::Genome,
    rng::RandomNumberGenerator,
};
use rand::Rng;

#[derive(Clone, Debug)]
struct Scalar(f64);

impl Genome for Scalar {
    fn evaluate(&self) -> Result<f64> {
        Ok(self.0.abs())
    }

    fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
        self.0 += rng.gen_range(-1.0..1.0);
    }

    fn crossover(&mut self, other: &mut Self, _rng: &mut RandomNumberGenerator) {
        std::mem::swap(&mut self.0, &mut other.0);
    }
}

#[test]
fn test_options_serialization() {
    let options = EvolutionOptions::builder()
        .population_count(3)
        .population_size(40)
        .replacement(Replacement::SteadyState { offspring: 5 })
        .evaluation_policy(EvaluationPolicy::Substitute(100.0))
        .seed(99)
        .build();

    let json = serde_json::to_string(&options).unwrap();
    let restored: EvolutionOptions = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, options);
}

#[test]
fn test_progress_reports_serialize() {
    let options = EvolutionOptions::builder()
        .population_count(2)
        .population_size(10)
        .generation_limit(5)
        .parallelism(1)
        .seed(3)
        .build();

    let lines = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&lines);

    let mut ga = GaBuilder::new()
        .with_options(options)
        .with_constructor(|rng| Scalar(rng.gen_range(-10.0..10.0)))
        .with_callback(move |snapshot| {
            let line = serde_json::to_string(&snapshot.report()).unwrap();
            sink.lock().unwrap().push(line);
        })
        .build()
        .unwrap();

    ga.minimize().unwrap();

    let lines = lines.lock().unwrap();
    assert_eq!(lines.len(), 6);

    let last: GenerationReport = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(last.generation, 5);
    assert_eq!(last.populations.len(), 2);
    let best = ga.best().unwrap().fitness();
    assert!((last.best_fitness.unwrap() - best).abs() < 1e-12);
}
