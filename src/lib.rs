//! # bdd-sampler: uniform solution sampling through Binary Decision Diagrams
//!
//! **`bdd-sampler`** compiles a single-output and-inverter graph into a
//! reduced ordered BDD with complemented edges, counts its satisfying
//! assignments exactly, and draws assignments uniformly at random from them.
//!
//! ## Pipeline
//!
//! ```text
//! Circuit ──compile──▶ output edge ──PathCounter──▶ counts ──Sampler──▶ Assignment ──AssignmentEncoder──▶ fields
//! ```
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All nodes live in the [`Bdd`][crate::bdd::Bdd] manager, which guarantees hash consing and canonical form.
//! - **Complemented Edges**: A [`Ref`][crate::reference::Ref] carries a negation bit, so a function and its negation share one node and `NOT` is free.
//! - **Dynamic Reordering**: Rudell's sifting shrinks the diagram during and after compilation without changing any function.
//! - **Exact Counting**: Path counts use arbitrary precision, so circuits with hundreds of inputs are counted exactly.
//! - **1-Based Variables**: Variables are 1-indexed (0 is reserved for the terminal).
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_sampler::aig::{AndGate, Circuit, Literal};
//! use bdd_sampler::bdd::Bdd;
//! use bdd_sampler::compile::compile;
//! use bdd_sampler::count::PathCounter;
//! use bdd_sampler::sample::Sampler;
//! use rand::SeedableRng;
//!
//! // out = in0 AND in1
//! let circuit = Circuit::new(
//!     vec![Literal::new(2), Literal::new(4)],
//!     vec![AndGate::new(Literal::new(6), Literal::new(2), Literal::new(4))],
//!     Literal::new(6),
//! );
//!
//! let bdd = Bdd::default();
//! let compiled = compile(&bdd, &circuit).unwrap();
//! let counts = PathCounter::new(&bdd, compiled.output);
//! assert_eq!(counts.satisfying(), num_bigint::BigUint::from(1u32));
//!
//! let sampler = Sampler::new(&bdd, &counts).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let assignment = sampler.sample(&mut rng).unwrap();
//! assert_eq!(assignment.bits(&compiled.inputs), vec![true, true]);
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: The manager: unique table, reference counting, AND/ITE.
//! - **[`reorder`]**: Adjacent swaps and sifting.
//! - **[`compile`]**: And-inverter graph to BDD.
//! - **[`count`]**: Exact path counting per polarity class.
//! - **[`sample`]**: Weighted random walk producing uniform solutions.
//! - **[`encode`]**: Grouping of assignment bits into multi-bit fields.

pub mod aig;
pub mod bdd;
pub mod cache;
pub mod compile;
pub mod count;
pub mod debug;
pub mod encode;
pub mod error;
pub mod node;
pub mod reference;
pub mod reorder;
pub mod sample;
pub mod subtable;
pub mod types;
pub mod utils;

pub use crate::error::{BddError, Result};
