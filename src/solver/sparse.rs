use clarabel::algebra::CscMatrix;

/// Coordinate-format matrix collected entry by entry and compressed to the
/// column-major layout the solver expects. Duplicate entries are summed.
#[derive(Debug, Clone)]
pub(crate) struct TripletMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletMatrix {
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    /// Adds `value` at `(row, col)`; exact zeros are skipped.
    pub(crate) fn push(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    #[cfg(test)]
    pub(crate) fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn into_csc(mut self) -> CscMatrix<f64> {
        self.entries.sort_by_key(|&(r, c, _)| (c, r));

        let mut colptr = Vec::with_capacity(self.cols + 1);
        let mut rowval: Vec<usize> = Vec::with_capacity(self.entries.len());
        let mut nzval: Vec<f64> = Vec::with_capacity(self.entries.len());
        colptr.push(0);

        let mut entries = self.entries.into_iter().peekable();
        for col in 0..self.cols {
            while let Some(&(r, _, v)) = entries.peek().filter(|e| e.1 == col) {
                entries.next();
                // same (row, col) as the previous entry: merge
                let dup = rowval.len() > colptr[col] && rowval.last() == Some(&r);
                if dup {
                    if let Some(last) = nzval.last_mut() {
                        *last += v;
                    }
                } else {
                    rowval.push(r);
                    nzval.push(v);
                }
            }
            colptr.push(rowval.len());
        }

        CscMatrix::new(self.rows, self.cols, colptr, rowval, nzval)
    }
}

/// A block of linear constraint rows `a' z (op) b` sharing one cone type.
#[derive(Debug, Clone, Default)]
pub(crate) struct RowBlock {
    coefficients: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
}

impl RowBlock {
    pub(crate) fn push_row(&mut self, coefficients: Vec<(usize, f64)>, rhs: f64) {
        self.coefficients.push(coefficients);
        self.rhs.push(rhs);
    }

    pub(crate) fn len(&self) -> usize {
        self.rhs.len()
    }
}

/// Stacks constraint blocks into one matrix `A` and right-hand side `b`,
/// in the order given.
pub(crate) fn stack_rows(blocks: &[&RowBlock], cols: usize) -> (CscMatrix<f64>, Vec<f64>) {
    let rows = blocks.iter().map(|b| b.len()).sum();
    let mut a = TripletMatrix::new(rows, cols);
    let mut b = Vec::with_capacity(rows);
    let mut offset = 0;
    for block in blocks {
        for (k, coeffs) in block.coefficients.iter().enumerate() {
            for &(col, value) in coeffs {
                a.push(offset + k, col, value);
            }
        }
        b.extend_from_slice(&block.rhs);
        offset += block.len();
    }
    (a.into_csc(), b)
}
