//! Splits constraint rows into equality and inequality blocks.

use sprs::{CsMat, TriMat};

use super::ir::{ProblemIr, RowSense, VarType};
use super::partition::VariablePartition;

/// Rows of one sense, in original order.
#[derive(Debug, Clone)]
pub struct RowBlock {
    pub sense: RowSense,
    /// Original row indices.
    pub rows: Vec<usize>,
    /// `rows.len() x n` CSR slice of `linear`.
    pub matrix: CsMat<f64>,
    pub rhs: Vec<f64>,
}

impl RowBlock {
    fn select(ir: &ProblemIr, sense: RowSense) -> Self {
        let rows: Vec<usize> = ir
            .sense()
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == sense)
            .map(|(r, _)| r)
            .collect();

        let mut tri = TriMat::new((rows.len(), ir.num_vars()));
        for (local, &row) in rows.iter().enumerate() {
            if let Some(view) = ir.linear().outer_view(row) {
                for (col, &v) in view.iter() {
                    tri.add_triplet(local, col, v);
                }
            }
        }
        let rhs = rows.iter().map(|&r| ir.rhs()[r]).collect();

        Self {
            sense,
            rows,
            matrix: tri.to_csr(),
            rhs,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column slices of this block, one per non-empty variable group.
    ///
    /// Summing `slice_t * x_t` over the returned groups reproduces `matrix * x`.
    pub fn by_type(&self, partition: &VariablePartition) -> Vec<(VarType, CsMat<f64>)> {
        let mut slices: Vec<(VarType, TriMat<f64>)> = partition
            .non_empty()
            .map(|(t, cols)| (t, TriMat::new((self.len(), cols.len()))))
            .collect();

        for (row, view) in self.matrix.outer_iterator().enumerate() {
            for (col, &v) in view.iter() {
                let (t, local) = partition.locate(col);
                if let Some((_, tri)) = slices.iter_mut().find(|(kind, _)| *kind == t) {
                    tri.add_triplet(row, local, v);
                }
            }
        }

        slices
            .into_iter()
            .map(|(t, tri)| (t, tri.to_csr()))
            .collect()
    }
}

/// Equality and inequality row blocks of a problem.
#[derive(Debug, Clone)]
pub struct ConstraintSplit {
    pub equality: RowBlock,
    pub inequality: RowBlock,
}

impl ConstraintSplit {
    pub fn new(ir: &ProblemIr) -> Self {
        Self {
            equality: RowBlock::select(ir, RowSense::Equality),
            inequality: RowBlock::select(ir, RowSense::Inequality),
        }
    }

    /// Non-empty blocks, equalities first.
    pub fn blocks(&self) -> impl Iterator<Item = &RowBlock> {
        [&self.equality, &self.inequality]
            .into_iter()
            .filter(|block| !block.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ir::csr_from_rows;
    use RowSense::*;

    fn problem(sense: Vec<RowSense>, vtype: Vec<VarType>) -> ProblemIr {
        let rows = vec![
            vec![1.0, 0.0, 2.0],
            vec![0.0, 3.0, 0.0],
            vec![4.0, 5.0, 6.0],
        ];
        ProblemIr::new(
            vec![0.0; 3],
            csr_from_rows(&rows, 3),
            sense,
            vec![10.0, 20.0, 30.0],
            vec![0.0; 3],
            vec![1.0; 3],
            vtype,
        )
    }

    #[test]
    fn test_mixed_rows_keep_order() {
        let ir = problem(vec![Inequality, Equality, Inequality], vec![VarType::Continuous; 3]);
        let split = ConstraintSplit::new(&ir);
        assert_eq!(split.equality.rows, vec![1]);
        assert_eq!(split.inequality.rows, vec![0, 2]);
        assert_eq!(split.inequality.rhs, vec![10.0, 30.0]);
        assert_eq!(split.inequality.matrix.get(1, 1), Some(&5.0));
        assert_eq!(split.equality.matrix.get(0, 1), Some(&3.0));
    }

    #[test]
    fn test_all_equality() {
        let ir = problem(vec![Equality; 3], vec![VarType::Continuous; 3]);
        let split = ConstraintSplit::new(&ir);
        assert!(split.inequality.is_empty());
        assert_eq!(split.equality.rows, vec![0, 1, 2]);
        assert_eq!(split.blocks().count(), 1);
    }

    #[test]
    fn test_type_slices_sum_to_block() {
        let ir = problem(
            vec![Inequality; 3],
            vec![VarType::Integer, VarType::Continuous, VarType::Integer],
        );
        let partition = VariablePartition::of(&ir);
        let split = ConstraintSplit::new(&ir);
        let slices = split.inequality.by_type(&partition);
        assert_eq!(slices.len(), 2);

        let (t, cont) = &slices[0];
        assert_eq!(*t, VarType::Continuous);
        assert_eq!(cont.cols(), 1);
        assert_eq!(cont.get(2, 0), Some(&5.0));

        let (t, int) = &slices[1];
        assert_eq!(*t, VarType::Integer);
        assert_eq!(int.cols(), 2);
        assert_eq!(int.get(0, 1), Some(&2.0));
        assert_eq!(int.get(2, 0), Some(&4.0));
        assert_eq!(int.get(1, 0), None);
    }
}
