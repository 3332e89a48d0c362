use crate::config::{GenerationConfig, LegacyMatrixKind};
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A square table of per-color-pair coefficients, indexed `[row][column]`
/// where the row is the acting particle's color and the column the neighbor's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    size: usize,
    values: Vec<f32>, // Row-major, size * size entries
}

impl Matrix {
    /// Creates a `size x size` matrix with every entry set to `value`.
    pub fn filled(size: usize, value: f32) -> Self {
        Matrix { size, values: vec![value; size * size] }
    }

    /// Builds a matrix by calling `generator(row, column)` for every entry.
    pub fn from_fn<F>(size: usize, mut generator: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut values = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                values.push(generator(row, col));
            }
        }
        Matrix { size, values }
    }

    /// Ones on the diagonal, zeros elsewhere.
    pub fn identity(size: usize) -> Self {
        Self::from_fn(size, |row, col| if row == col { 1.0 } else { 0.0 })
    }

    /// Entries drawn uniformly from `[-1, 1)`.
    pub fn random<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        Self::from_fn(size, |_, _| rng.random_range(-1.0..1.0))
    }

    /// Entries drawn uniformly from `[min, max)`. Collapses to `min` when the range is empty.
    pub fn random_range<R: Rng + ?Sized>(size: usize, min: f32, max: f32, rng: &mut R) -> Self {
        Self::from_fn(size, |_, _| if max > min { rng.random_range(min..max) } else { min })
    }

    /// Entries with a magnitude drawn from `[min, max)` and a random sign.
    pub fn random_signed<R: Rng + ?Sized>(size: usize, min: f32, max: f32, rng: &mut R) -> Self {
        Self::from_fn(size, |_, _| {
            let magnitude = if max > min { rng.random_range(min..max) } else { min };
            if rng.random_bool(0.5) { magnitude } else { -magnitude }
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unchecked lookup for the hot path. Callers guarantee both indices are below `size`.
    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.size + col]
    }

    pub fn try_get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.size && col < self.size {
            Some(self.values[row * self.size + col])
        } else {
            None
        }
    }

    /// Overwrites a single entry. Indices outside the matrix are rejected.
    pub fn set(&mut self, row: usize, col: usize, value: f32) -> Result<()> {
        if row >= self.size || col >= self.size {
            anyhow::bail!(
                "Matrix index ({}, {}) out of range for a {}x{} matrix.",
                row, col, self.size, self.size
            );
        }
        if !value.is_finite() {
            anyhow::bail!("Matrix entry ({}, {}) must be finite, got {}.", row, col, value);
        }
        self.values[row * self.size + col] = value;
        Ok(())
    }

    /// Iterates rows as slices, for display.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks(0) panics, and an empty matrix has no rows anyway
        self.values.chunks(self.size.max(1))
    }

    /// Largest entry, or 0.0 for an empty matrix.
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }
}

/// Selects one of the four interaction tables.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Forces,
    MinDistances,
    Radii,
    Legacy,
}

/// The four interaction tables. All share one dimension, `colors_count`,
/// and can only be resized together through [`ParameterMatrices::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMatrices {
    colors_count: usize,
    forces: Matrix,
    min_distances: Matrix,
    radii: Matrix,
    legacy: Matrix,
}

impl ParameterMatrices {
    /// Generates a fresh set of matrices for `colors_count` colors using the
    /// ranges from the `[generation]` config section.
    pub fn generate<R: Rng + ?Sized>(colors_count: usize, settings: &GenerationConfig, rng: &mut R) -> Self {
        let forces = Matrix::random_signed(
            colors_count,
            settings.force_magnitude_range[0],
            settings.force_magnitude_range[1],
            rng,
        );
        let min_distances = Matrix::random_range(
            colors_count,
            settings.min_distance_range[0],
            settings.min_distance_range[1],
            rng,
        );
        let radii = Matrix::random_range(
            colors_count,
            settings.radius_range[0],
            settings.radius_range[1],
            rng,
        );
        let legacy = match settings.legacy_matrix {
            LegacyMatrixKind::Random => Matrix::random(colors_count, rng),
            LegacyMatrixKind::Identity => Matrix::identity(colors_count),
        };
        ParameterMatrices { colors_count, forces, min_distances, radii, legacy }
    }

    /// Uniform tables: every pair shares the same coefficients. Mostly useful for
    /// controlled setups and tests.
    pub fn uniform(colors_count: usize, force: f32, min_distance: f32, radius: f32, legacy: f32) -> Self {
        ParameterMatrices {
            colors_count,
            forces: Matrix::filled(colors_count, force),
            min_distances: Matrix::filled(colors_count, min_distance),
            radii: Matrix::filled(colors_count, radius),
            legacy: Matrix::filled(colors_count, legacy),
        }
    }

    pub fn colors_count(&self) -> usize {
        self.colors_count
    }

    pub fn forces(&self) -> &Matrix {
        &self.forces
    }

    pub fn min_distances(&self) -> &Matrix {
        &self.min_distances
    }

    pub fn radii(&self) -> &Matrix {
        &self.radii
    }

    pub fn legacy(&self) -> &Matrix {
        &self.legacy
    }

    pub fn get_matrix(&self, kind: MatrixKind) -> &Matrix {
        match kind {
            MatrixKind::Forces => &self.forces,
            MatrixKind::MinDistances => &self.min_distances,
            MatrixKind::Radii => &self.radii,
            MatrixKind::Legacy => &self.legacy,
        }
    }

    /// Overwrites one entry of the selected table. The tables themselves are never
    /// handed out mutably, so only [`ParameterMatrices::generate`] changes their size.
    pub fn set_entry(&mut self, kind: MatrixKind, row: usize, col: usize, value: f32) -> Result<()> {
        if matches!(kind, MatrixKind::MinDistances | MatrixKind::Radii) && value < 0.0 {
            anyhow::bail!("{:?} entries must be non-negative, got {}.", kind, value);
        }
        let matrix = match kind {
            MatrixKind::Forces => &mut self.forces,
            MatrixKind::MinDistances => &mut self.min_distances,
            MatrixKind::Radii => &mut self.radii,
            MatrixKind::Legacy => &mut self.legacy,
        };
        matrix.set(row, col, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn identity_has_unit_diagonal() {
        let m = Matrix::identity(3);
        for row in 0..3 {
            for col in 0..3 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert_eq!(m.get(row, col), expected);
            }
        }
    }

    #[test]
    fn random_entries_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let m = Matrix::random(6, &mut rng);
        assert_eq!(m.size(), 6);
        assert!(m.rows().flatten().all(|v| (-1.0..1.0).contains(v)));

        let r = Matrix::random_range(4, 30.0, 50.0, &mut rng);
        assert!(r.rows().flatten().all(|v| (30.0..50.0).contains(v)));

        let s = Matrix::random_signed(4, 0.3, 1.0, &mut rng);
        assert!(s.rows().flatten().all(|v| (0.3..1.0).contains(&v.abs())));
    }

    #[test]
    fn set_rejects_out_of_range_indices() {
        let mut m = Matrix::filled(2, 0.0);
        assert!(m.set(1, 1, 0.5).is_ok());
        assert_eq!(m.get(1, 1), 0.5);
        assert!(m.set(2, 0, 1.0).is_err());
        assert!(m.set(0, 0, f32::NAN).is_err());
        assert_eq!(m.try_get(0, 2), None);
    }

    #[test]
    fn generated_tables_share_dimension() {
        let mut rng = StdRng::seed_from_u64(99);
        let settings = GenerationConfig::default();
        let matrices = ParameterMatrices::generate(5, &settings, &mut rng);
        assert_eq!(matrices.colors_count(), 5);
        for m in [matrices.forces(), matrices.min_distances(), matrices.radii(), matrices.legacy()] {
            assert_eq!(m.size(), 5);
            assert_eq!(m.rows().count(), 5);
        }
    }

    #[test]
    fn empty_matrices_are_allowed() {
        let mut rng = StdRng::seed_from_u64(3);
        let matrices = ParameterMatrices::generate(0, &GenerationConfig::default(), &mut rng);
        assert_eq!(matrices.colors_count(), 0);
        assert_eq!(matrices.forces().rows().count(), 0);
        assert_eq!(matrices.radii().max_value(), 0.0);
    }

    #[test]
    fn entry_edits_keep_the_dimension() {
        let mut matrices = ParameterMatrices::uniform(3, 0.5, 10.0, 40.0, 0.0);
        matrices.set_entry(MatrixKind::Forces, 0, 2, -0.75).unwrap();
        matrices.set_entry(MatrixKind::Legacy, 2, 2, 1.0).unwrap();
        assert_eq!(matrices.forces().get(0, 2), -0.75);
        assert_eq!(matrices.get_matrix(MatrixKind::Legacy).get(2, 2), 1.0);

        assert!(matrices.set_entry(MatrixKind::Radii, 3, 0, 5.0).is_err());
        assert!(matrices.set_entry(MatrixKind::MinDistances, 0, 0, -1.0).is_err());
        assert!(matrices.set_entry(MatrixKind::Forces, 0, 0, f32::INFINITY).is_err());
        assert_eq!(matrices.colors_count(), 3);
        assert_eq!(matrices.radii().size(), 3);
    }
}
