//! Parallelization helpers for filling multiple layers.
//!
//! A solver instance captures the mask and factorisation at construction
//! and never mutates them afterwards, so one instance can safely drive
//! fills of disjoint layer memories from several threads at once.

use crate::component::Component;
use crate::types::Result;
use crate::Solver;
use ndarray::{ArrayViewMut3, Axis};
use rayon::prelude::*;

/// Fill every layer of a stack with the same solver, in parallel.
pub fn fill_layers<C: Component>(solver: &Solver, mut layers: ArrayViewMut3<C>) -> Result<()> {
    let num_layers = layers.shape()[0];
    log::debug!("filling {} layers in parallel", num_layers);

    // Collect mutable layer views so rayon can hand one to each worker.
    let results: Vec<Result<()>> = layers
        .axis_iter_mut(Axis(0))
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|mut layer| solver.fill(layer.view_mut()).map(|_| ()))
        .collect();

    for result in results {
        result?;
    }

    Ok(())
}
