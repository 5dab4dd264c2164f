use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::{GeneticError, Result};
use crate::evolution::engine::{Callback, Constructor, EarlyStop, Ga};
use crate::evolution::options::EvolutionOptions;
use crate::evolution::snapshot::Snapshot;
use crate::genome::Genome;
use crate::migration::Migrator;
use crate::rng::RandomNumberGenerator;
use crate::selection::{SelectionStrategy, TournamentSelection};
use crate::speciation::Speciator;

/// Fluent construction of a [`Ga`].
///
/// Only the genome constructor is required. Selection defaults to
/// tournaments of 3; speciation, migration, callback, early stop and
/// cancellation are off unless set.
///
/// # Example
///
/// ```rust
/// use gaopt::error::Result;
/// use gaopt::evolution::{EvolutionOptions, GaBuilder};
/// use gaopt::genome::Genome;
/// use gaopt::rng::RandomNumberGenerator;
/// use rand::Rng;
///
/// #[derive(Clone, Debug)]
/// struct Guess(f64);
///
/// impl Genome for Guess {
///     fn evaluate(&self) -> Result<f64> {
///         Ok((self.0 - 3.0).abs())
///     }
///     fn mutate(&mut self, rng: &mut RandomNumberGenerator) {
///         self.0 += rng.gen_range(-0.5..0.5);
///     }
///     fn crossover(&mut self, other: &mut Self, _rng: &mut RandomNumberGenerator) {
///         let mid = (self.0 + other.0) / 2.0;
///         self.0 = mid;
///         other.0 = mid;
///     }
/// }
///
/// let options = EvolutionOptions::builder()
///     .population_count(1)
///     .population_size(20)
///     .generation_limit(30)
///     .parallelism(1)
///     .seed(1)
///     .build();
///
/// let mut ga = GaBuilder::new()
///     .with_options(options)
///     .with_constructor(|rng| Guess(rng.gen_range(-10.0..10.0)))
///     .build()
///     .unwrap();
///
/// let result = ga.minimize().unwrap();
/// assert!(result.best.fitness() < 1.0);
/// ```
pub struct GaBuilder<G: Genome> {
    options: EvolutionOptions,
    constructor: Option<Constructor<G>>,
    selection: Option<Arc<dyn SelectionStrategy>>,
    speciator: Option<Arc<dyn Speciator<G>>>,
    migrator: Option<Arc<dyn Migrator<G>>>,
    callback: Option<Callback<G>>,
    early_stop: Option<EarlyStop<G>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<G: Genome> GaBuilder<G> {
    pub fn new() -> Self {
        Self {
            options: EvolutionOptions::default(),
            constructor: None,
            selection: None,
            speciator: None,
            migrator: None,
            callback: None,
            early_stop: None,
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: EvolutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the function building random genomes for the initial populations.
    pub fn with_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&mut RandomNumberGenerator) -> G + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    pub fn with_selection<S>(mut self, selection: S) -> Self
    where
        S: SelectionStrategy + 'static,
    {
        self.selection = Some(Arc::new(selection));
        self
    }

    /// Splits every population into species before breeding.
    pub fn with_speciation<S>(mut self, speciator: S) -> Self
    where
        S: Speciator<G> + 'static,
    {
        self.speciator = Some(Arc::new(speciator));
        self
    }

    /// Exchanges individuals between populations every
    /// `migration_frequency` generations.
    pub fn with_migration<M>(mut self, migrator: M) -> Self
    where
        M: Migrator<G> + 'static,
    {
        self.migrator = Some(Arc::new(migrator));
        self
    }

    /// Called after initialization and after every generation.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Snapshot<'_, G>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Stops [`Ga::run`] once the predicate holds at a generation boundary.
    pub fn with_early_stop<F>(mut self, early_stop: F) -> Self
    where
        F: Fn(&Snapshot<'_, G>) -> bool + Send + Sync + 'static,
    {
        self.early_stop = Some(Box::new(early_stop));
        self
    }

    /// Stops [`Ga::run`] at the next generation boundary once the flag is set.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// # Errors
    ///
    /// Returns a `Configuration` error if no constructor was given. All other
    /// checks happen in [`Ga::initialize`].
    pub fn build(self) -> Result<Ga<G>> {
        let constructor = self.constructor.ok_or_else(|| {
            GeneticError::Configuration("Genome constructor not specified".to_string())
        })?;
        let selection = self
            .selection
            .unwrap_or_else(|| Arc::new(TournamentSelection::default()) as Arc<dyn SelectionStrategy>);

        Ok(Ga::new(
            self.options,
            constructor,
            selection,
            self.speciator,
            self.migrator,
            self.callback,
            self.early_stop,
            self.cancel,
        ))
    }
}

impl<G: Genome> Default for GaBuilder<G> {
    fn default() -> Self {
        Self::new()
    }
}
