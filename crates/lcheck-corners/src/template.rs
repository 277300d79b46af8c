//! Saddle-cross templates and a memoizing factory for them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Intensity of the two diagonals.
pub const DIAGONAL_VALUE: u8 = 128;
/// Intensity of the two bright wedges.
pub const WEDGE_VALUE: u8 = 255;

/// A square hourglass template: bright wedges above and below the center,
/// mid-gray diagonals, dark left and right wedges.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossTemplate {
    pub size: usize,
    /// Row-major pixels.
    pub data: Vec<u8>,
    taps: Vec<(usize, usize, f32)>,
    norm: f64,
}

impl CrossTemplate {
    /// Render the template for an odd `size`.
    pub fn new(size: usize) -> Self {
        let mut data = vec![0u8; size * size];
        for i in 0..size {
            data[i * size + i] = DIAGONAL_VALUE;
            data[i * size + (size - 1 - i)] = DIAGONAL_VALUE;
        }
        for i in 0..size {
            let row = &mut data[i * size..(i + 1) * size];
            // upper wedge: strictly between the diagonals
            for v in row.iter_mut().take(size.saturating_sub(i + 1)).skip(i + 1) {
                *v = WEDGE_VALUE;
            }
            // lower wedge
            for v in row.iter_mut().take(i).skip(size.saturating_sub(i)) {
                *v = WEDGE_VALUE;
            }
        }

        let taps: Vec<(usize, usize, f32)> = data
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(k, &v)| (k % size, k / size, v as f32))
            .collect();
        let norm = taps
            .iter()
            .map(|&(_, _, v)| (v as f64) * (v as f64))
            .sum::<f64>()
            .sqrt();

        Self {
            size,
            data,
            taps,
            norm,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.size + x]
    }

    /// Non-zero pixels as `(x, y, value)`.
    pub fn taps(&self) -> &[(usize, usize, f32)] {
        &self.taps
    }

    /// Euclidean norm of the template pixels.
    pub fn norm(&self) -> f64 {
        self.norm
    }
}

/// Memoizing template factory keyed by size.
///
/// Templates are immutable once built and are never evicted. A bank is owned
/// by whoever runs the correlation stage; `get(size)` always returns a
/// template equal to `CrossTemplate::new(size)`.
#[derive(Debug, Default)]
pub struct TemplateBank {
    cache: RwLock<HashMap<usize, Arc<CrossTemplate>>>,
}

impl TemplateBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template for `size`, rendering it on first use.
    pub fn get(&self, size: usize) -> Arc<CrossTemplate> {
        if let Some(t) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&size)
        {
            return Arc::clone(t);
        }
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            cache
                .entry(size)
                .or_insert_with(|| Arc::new(CrossTemplate::new(size))),
        )
    }

    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
