//! # Slice Operators
//!
//! Ready-made building blocks for implementing [`Genome`](crate::genome::Genome)
//! on vector-shaped payloads. Every operator works in place on slices, keeps
//! the length of its inputs, and takes any `rand::Rng`, including the
//! engine's [`RandomNumberGenerator`](crate::rng::RandomNumberGenerator).
//!
//! # Crossover
//!
//! - [`crossover_gnx`]: generalized n-point crossover
//! - [`crossover_pmx`]: partially mapped crossover, keeps permutations valid
//! - [`crossover_uniform_f64`]: per-gene random blend of two float vectors
//!
//! # Mutation
//!
//! - [`mutate_permute`]: swap random pairs of positions
//! - [`mutate_splice`]: cut a random segment and reinsert it elsewhere
//! - [`mutate_normal_f64`]: multiplicative Gaussian noise
//! - [`mutate_uniform`]: resample random positions from a corpus
//!
//! # Initialization
//!
//! - [`init_uniform_f64`], [`init_uniform_from`], [`init_permutation`]

mod crossover;
mod initialization;
mod mutation;

pub use crossover::{crossover_gnx, crossover_pmx, crossover_uniform_f64};
pub use initialization::{init_permutation, init_uniform_f64, init_uniform_from};
pub use mutation::{mutate_normal_f64, mutate_permute, mutate_splice, mutate_uniform};
