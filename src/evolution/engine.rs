//! # Engine
//!
//! [`Ga`] drives a run through its states:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --enhance/run--> Evolving --run ends--> Stopped
//! ```
//!
//! One generation ([`Ga::enhance`]) runs, for every population in order:
//! speciation (if configured), then per species parent selection, variation,
//! offspring evaluation and replacement, then the merge back into one
//! population. Migration follows when due, then the hall of fame is updated,
//! the generation counter and age advance, and the callback sees a
//! [`Snapshot`].
//!
//! [`Ga::run`] repeats generations until the generation limit, the time
//! limit, the early-stop predicate or the cancellation flag ends the run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::breeding::{self, BreedingContext, VariationRates};
use crate::error::{GeneticError, OptionExt, Result};
use crate::evaluation::{EvaluationFailure, Evaluator};
use crate::evolution::options::EvolutionOptions;
use crate::evolution::snapshot::Snapshot;
use crate::genome::Genome;
use crate::hall_of_fame::HallOfFame;
use crate::individual::Individual;
use crate::migration::Migrator;
use crate::population::Population;
use crate::rng::RandomNumberGenerator;
use crate::selection::SelectionStrategy;
use crate::speciation::Speciator;

/// Builds a fresh random genome.
pub type Constructor<G> = Arc<dyn Fn(&mut RandomNumberGenerator) -> G + Send + Sync>;

/// Called at every generation boundary, including right after initialization.
pub type Callback<G> = Box<dyn FnMut(&Snapshot<'_, G>) + Send>;

/// Ends the run when it returns `true`.
pub type EarlyStop<G> = Box<dyn Fn(&Snapshot<'_, G>) -> bool + Send + Sync>;

/// Lifecycle of an engine.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initialized,
    Evolving,
    Stopped,
}

/// Why [`Ga::run`] returned.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GenerationLimit,
    TimeLimit,
    EarlyStop,
    Cancelled,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct GaResult<G: Genome> {
    /// Best individual ever seen.
    pub best: Individual<G>,
    /// Hall of fame, best first.
    pub hall_of_fame: Vec<Individual<G>>,
    /// Completed generations.
    pub generations: usize,
    pub age: Duration,
    pub stop_reason: StopReason,
}

/// A genetic algorithm engine.
///
/// Built with [`GaBuilder`](crate::evolution::builder::GaBuilder).
pub struct Ga<G: Genome> {
    options: EvolutionOptions,
    constructor: Constructor<G>,
    selection: Arc<dyn SelectionStrategy>,
    speciator: Option<Arc<dyn Speciator<G>>>,
    migrator: Option<Arc<dyn Migrator<G>>>,
    callback: Option<Callback<G>>,
    early_stop: Option<EarlyStop<G>>,
    cancel: Option<Arc<AtomicBool>>,

    state: EngineState,
    populations: Vec<Population<G>>,
    hall_of_fame: HallOfFame<G>,
    generation: usize,
    age: Duration,
    started: Option<Instant>,
    rng: RandomNumberGenerator,
    evaluator: Option<Evaluator>,
    failures: Vec<EvaluationFailure>,
}

impl<G: Genome> Ga<G> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        options: EvolutionOptions,
        constructor: Constructor<G>,
        selection: Arc<dyn SelectionStrategy>,
        speciator: Option<Arc<dyn Speciator<G>>>,
        migrator: Option<Arc<dyn Migrator<G>>>,
        callback: Option<Callback<G>>,
        early_stop: Option<EarlyStop<G>>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        let hof_size = options.get_hof_size();
        Self {
            options,
            constructor,
            selection,
            speciator,
            migrator,
            callback,
            early_stop,
            cancel,
            state: EngineState::Uninitialized,
            populations: Vec::new(),
            hall_of_fame: HallOfFame::new(hof_size),
            generation: 0,
            age: Duration::ZERO,
            started: None,
            rng: RandomNumberGenerator::default(),
            evaluator: None,
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn options(&self) -> &EvolutionOptions {
        &self.options
    }

    /// Completed generations.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Wall-clock time since initialization, as of the last generation boundary.
    pub fn age(&self) -> Duration {
        self.age
    }

    pub fn populations(&self) -> &[Population<G>] {
        &self.populations
    }

    pub fn hall_of_fame(&self) -> &HallOfFame<G> {
        &self.hall_of_fame
    }

    /// Best individual ever seen.
    pub fn best(&self) -> Option<&Individual<G>> {
        self.hall_of_fame.best()
    }

    /// Evaluation failures of the last generation.
    pub fn failures(&self) -> &[EvaluationFailure] {
        &self.failures
    }

    pub fn snapshot(&self) -> Snapshot<'_, G> {
        Snapshot {
            generation: self.generation,
            age: self.age,
            best: self.hall_of_fame.best(),
            hall_of_fame: self.hall_of_fame.entries(),
            populations: &self.populations,
            failures: &self.failures,
        }
    }

    /// Validates the configuration and builds and evaluates the initial
    /// populations.
    ///
    /// Calling it again restarts the run from scratch.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error when the options, the selection
    /// strategy, the speciator or the migrator do not fit together. Nothing is
    /// built in that case.
    pub fn initialize(&mut self) -> Result<()> {
        let options = &self.options;
        options.validate()?;

        let size = options.get_population_size();
        self.selection.validate(size).map_err(as_configuration)?;
        if let Some(speciator) = &self.speciator {
            speciator.validate(size).map_err(as_configuration)?;
        }
        if let Some(migrator) = &self.migrator {
            migrator.validate(size).map_err(as_configuration)?;
        }

        let evaluator = Evaluator::new(options.get_parallelism(), options.get_evaluation_policy())?;
        let mut rng = RandomNumberGenerator::from_optional_seed(options.get_seed());

        let started = Instant::now();
        let mut populations = Vec::with_capacity(options.get_population_count());
        let mut failures = Vec::new();
        for id in 0..options.get_population_count() {
            let constructor = &self.constructor;
            let mut population = Population::generate(id, size, |r| constructor(r), &mut rng)?;
            failures.extend(population.evaluate_all(&evaluator));
            population.sort();
            populations.push(population);
        }

        let mut hall_of_fame = HallOfFame::new(options.get_hof_size());
        for population in &populations {
            hall_of_fame.update(population.individuals());
        }

        info!(
            populations = populations.len(),
            population_size = size,
            parallelism = evaluator.parallelism(),
            seed = ?options.get_seed(),
            best = ?hall_of_fame.best().map(|b| b.fitness()),
            "initialized"
        );

        self.populations = populations;
        self.hall_of_fame = hall_of_fame;
        self.failures = failures;
        self.rng = rng;
        self.evaluator = Some(evaluator);
        self.generation = 0;
        self.started = Some(started);
        self.age = started.elapsed();
        self.state = EngineState::Initialized;

        self.notify();
        Ok(())
    }

    /// Runs one generation.
    ///
    /// # Errors
    ///
    /// Returns an `Evolution` error before [`initialize`](Self::initialize),
    /// and propagates operator failures. Evaluation failures never surface
    /// here; they are handled by the evaluation policy and reported in the
    /// snapshot.
    pub fn enhance(&mut self) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            return Err(GeneticError::Evolution(
                "enhance called before initialize".to_string(),
            ));
        }
        self.state = EngineState::Evolving;

        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or_else_genetic(|| GeneticError::Evolution("engine has no evaluator".to_string()))?;
        let ctx = BreedingContext {
            selection: self.selection.as_ref(),
            replacement: self.options.get_replacement(),
            rates: VariationRates {
                crossover_rate: self.options.get_crossover_rate(),
                mutation_rate: self.options.get_mutation_rate(),
            },
            evaluator,
        };

        let mut failures = Vec::new();
        for population in self.populations.iter_mut() {
            match &self.speciator {
                Some(speciator) => {
                    let mut species = speciator.apply(population)?;
                    let mut outcome = Ok(());
                    for part in species.iter_mut() {
                        match breeding::breed(part, &ctx) {
                            Ok(part_failures) => failures.extend(part_failures),
                            Err(err) => {
                                outcome = Err(err);
                                break;
                            }
                        }
                    }
                    population.merge(species);
                    population.sort();
                    outcome?;
                }
                None => failures.extend(breeding::breed(population, &ctx)?),
            }
        }

        let frequency = self.options.get_migration_frequency();
        if let Some(migrator) = &self.migrator {
            if frequency > 0 && self.populations.len() > 1 && (self.generation + 1) % frequency == 0
            {
                migrator.migrate(&mut self.populations, &mut self.rng)?;
            }
        }

        for population in &self.populations {
            self.hall_of_fame.update(population.individuals());
        }

        self.generation += 1;
        self.age = self.started.map_or(Duration::ZERO, |s| s.elapsed());
        self.failures = failures;

        debug!(
            generation = self.generation,
            best = ?self.hall_of_fame.best().map(|b| b.fitness()),
            stats = ?self.populations.iter().filter_map(|p| p.stats()).collect::<Vec<_>>(),
            failures = self.failures.len(),
            "generation complete"
        );

        self.notify();
        Ok(())
    }

    /// Runs generations until a stop condition holds.
    ///
    /// Conditions are checked at generation boundaries: cancellation first,
    /// then the early-stop predicate, then the generation and time limits.
    /// The generation limit counts generations since initialization, so
    /// calling `run` again on a finished engine returns immediately.
    ///
    /// # Errors
    ///
    /// Returns an `Evolution` error before [`initialize`](Self::initialize)
    /// and propagates operator failures.
    pub fn run(&mut self) -> Result<StopReason> {
        if self.state == EngineState::Uninitialized {
            return Err(GeneticError::Evolution(
                "run called before initialize".to_string(),
            ));
        }

        let reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            if let Err(err) = self.enhance() {
                self.state = EngineState::Stopped;
                return Err(err);
            }
        };

        self.state = EngineState::Stopped;
        info!(
            generations = self.generation,
            age = ?self.age,
            reason = ?reason,
            best = ?self.best().map(|b| b.fitness()),
            "run finished"
        );

        Ok(reason)
    }

    /// Initializes and runs to completion.
    pub fn minimize(&mut self) -> Result<GaResult<G>> {
        self.initialize()?;
        let reason = self.run()?;
        self.result(reason)
    }

    /// Packages the current state as a [`GaResult`].
    pub fn result(&self, stop_reason: StopReason) -> Result<GaResult<G>> {
        let best = self
            .hall_of_fame
            .best()
            .cloned()
            .ok_or_else_genetic(|| GeneticError::EmptyPopulation)?;

        Ok(GaResult {
            best,
            hall_of_fame: self.hall_of_fame.entries().to_vec(),
            generations: self.generation,
            age: self.age,
            stop_reason,
        })
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some(StopReason::Cancelled);
        }
        if let Some(early_stop) = &self.early_stop {
            if early_stop(&self.snapshot()) {
                return Some(StopReason::EarlyStop);
            }
        }
        if self.generation >= self.options.get_generation_limit() {
            return Some(StopReason::GenerationLimit);
        }
        if let (Some(limit), Some(started)) = (self.options.get_time_limit(), self.started) {
            if started.elapsed() >= limit {
                return Some(StopReason::TimeLimit);
            }
        }
        None
    }

    fn notify(&mut self) {
        if let Some(mut callback) = self.callback.take() {
            callback(&self.snapshot());
            self.callback = Some(callback);
        }
    }
}

/// Strategy contract violations found before the run are configuration errors.
fn as_configuration(err: GeneticError) -> GeneticError {
    match err {
        GeneticError::Operator(msg) => GeneticError::Configuration(msg),
        other => other,
    }
}

impl<G: Genome> fmt::Debug for Ga<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ga")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("age", &self.age)
            .field("options", &self.options)
            .field("selection", &self.selection)
            .field("speciator", &self.speciator)
            .field("migrator", &self.migrator)
            .field("best", &self.best().map(|b| b.fitness()))
            .finish_non_exhaustive()
    }
}
