use ndarray::{prelude::*, s};

/// A square grid of weights that grows to fit the largest index written to it. Indexes at or beyond the current order read as zero.
#[derive(Clone, Debug)]
pub struct ResizableMatrix {
	data: Array2<f64>,
}

impl Default for ResizableMatrix {
	fn default() -> Self {
		Self {
			data: Array2::zeros((0, 0)),
		}
	}
}

impl ResizableMatrix {
	/// The order of the matrix, which is both its number of rows and its number of columns.
	pub fn size(&self) -> usize {
		self.data.nrows()
	}

	/// Store `value` at `(i, j)`, growing the matrix once if either index is out of bounds.
	pub fn set(&mut self, i: usize, j: usize, value: f64) {
		self.resize(i.max(j) + 1);
		self.data[(i, j)] = value;
	}

	pub fn add(&mut self, i: usize, j: usize, value: f64) {
		let current = self.at(i, j);
		self.set(i, j, current + value);
	}

	pub fn at(&self, i: usize, j: usize) -> f64 {
		self.data.get((i, j)).copied().unwrap_or(0.0)
	}

	pub fn row(&self, i: usize) -> Option<Vec<f64>> {
		if i < self.size() {
			Some(self.data.row(i).to_vec())
		} else {
			None
		}
	}

	pub fn column(&self, j: usize) -> Option<Vec<f64>> {
		if j < self.size() {
			Some(self.data.column(j).to_vec())
		} else {
			None
		}
	}

	pub fn row_sum(&self, i: usize) -> f64 {
		if i < self.size() {
			self.data.row(i).sum()
		} else {
			0.0
		}
	}

	pub fn col_sum(&self, j: usize) -> f64 {
		if j < self.size() {
			self.data.column(j).sum()
		} else {
			0.0
		}
	}

	/// The sum of every row, indexed by row.
	pub fn row_sums(&self) -> Array1<f64> {
		self.data.sum_axis(Axis(1))
	}

	/// The sum of every column, indexed by column.
	pub fn col_sums(&self) -> Array1<f64> {
		self.data.sum_axis(Axis(0))
	}

	pub fn diag(&self) -> ArrayView1<f64> {
		self.data.diag()
	}

	pub fn diagonal_sum(&self) -> f64 {
		self.data.diag().sum()
	}

	pub fn sum(&self) -> f64 {
		self.data.sum()
	}

	/// Add every cell of `other` to the matching cell of `self`.
	pub fn merge(&mut self, other: &ResizableMatrix) {
		let size = other.size();
		self.resize(size);
		let mut cells = self.data.slice_mut(s![..size, ..size]);
		cells += &other.data;
	}

	pub fn reset(&mut self) {
		*self = Self::default();
	}

	fn resize(&mut self, n: usize) {
		let size = self.size();
		if n <= size {
			return;
		}
		log::debug!("growing matrix from order {} to {}", size, n);
		let mut data = Array2::<f64>::zeros((n, n));
		data.slice_mut(s![..size, ..size]).assign(&self.data);
		self.data = data;
	}
}

#[test]
fn test_empty() {
	let matrix = ResizableMatrix::default();
	assert_eq!(matrix.size(), 0);
	assert_eq!(matrix.at(0, 0), 0.0);
	assert_eq!(matrix.row(0), None);
	assert_eq!(matrix.column(0), None);
	assert_eq!(matrix.row_sum(0), 0.0);
	assert_eq!(matrix.col_sum(0), 0.0);
	assert_eq!(matrix.sum(), 0.0);
	assert_eq!(matrix.diagonal_sum(), 0.0);
}

#[test]
fn test_set_grows_to_largest_index() {
	let mut matrix = ResizableMatrix::default();
	matrix.set(0, 2, 1.5);
	assert_eq!(matrix.size(), 3);
	matrix.set(4, 1, 2.0);
	assert_eq!(matrix.size(), 5);
	matrix.set(1, 1, 3.0);
	assert_eq!(matrix.size(), 5);
	assert_eq!(matrix.at(0, 2), 1.5);
	assert_eq!(matrix.at(4, 1), 2.0);
	assert_eq!(matrix.at(1, 1), 3.0);
	assert_eq!(matrix.at(9, 9), 0.0);
	assert_eq!(matrix.size(), 5);
}

#[test]
fn test_growth_preserves_history() {
	let mut matrix = ResizableMatrix::default();
	for i in 0..3 {
		for j in 0..3 {
			matrix.set(i, j, (i * 3 + j) as f64);
		}
	}
	matrix.add(7, 0, 1.0);
	assert_eq!(matrix.size(), 8);
	for i in 0..3 {
		for j in 0..3 {
			assert_eq!(matrix.at(i, j), (i * 3 + j) as f64);
		}
	}
	assert_eq!(matrix.row(7), Some(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
	assert_eq!(matrix.row(2), Some(vec![6.0, 7.0, 8.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
}

#[test]
fn test_sums() {
	let mut matrix = ResizableMatrix::default();
	matrix.set(0, 0, 2.0);
	matrix.set(0, 1, 3.0);
	matrix.set(1, 0, 5.0);
	matrix.add(1, 1, 7.0);
	matrix.add(1, 1, 1.0);
	assert_eq!(matrix.row_sum(0), 5.0);
	assert_eq!(matrix.row_sum(1), 13.0);
	assert_eq!(matrix.col_sum(0), 7.0);
	assert_eq!(matrix.col_sum(1), 11.0);
	assert_eq!(matrix.row_sums().to_vec(), vec![5.0, 13.0]);
	assert_eq!(matrix.col_sums().to_vec(), vec![7.0, 11.0]);
	assert_eq!(matrix.diagonal_sum(), 10.0);
	assert_eq!(matrix.sum(), 18.0);
	assert_eq!(matrix.column(1), Some(vec![3.0, 8.0]));
}

#[test]
fn test_merge() {
	let mut a = ResizableMatrix::default();
	a.set(0, 0, 1.0);
	a.set(0, 1, 2.0);
	let mut b = ResizableMatrix::default();
	b.set(0, 1, 1.0);
	b.set(2, 2, 4.0);
	a.merge(&b);
	assert_eq!(a.size(), 3);
	assert_eq!(a.row(0), Some(vec![1.0, 3.0, 0.0]));
	assert_eq!(a.row(2), Some(vec![0.0, 0.0, 4.0]));
	b.merge(&ResizableMatrix::default());
	assert_eq!(b.size(), 3);
	assert_eq!(b.sum(), 5.0);
}

#[test]
#[should_panic]
fn test_set_panics_when_too_large_to_allocate() {
	let mut matrix = ResizableMatrix::default();
	matrix.set(i64::MAX as usize, 0, 1.0);
}

#[test]
fn test_reset() {
	let mut matrix = ResizableMatrix::default();
	matrix.set(3, 3, 1.0);
	matrix.reset();
	assert_eq!(matrix.size(), 0);
	assert_eq!(matrix.sum(), 0.0);
}
