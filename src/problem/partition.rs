//! Splits the variable set into disjoint type groups.

use super::ir::{ProblemIr, VarType};

/// Order-preserving partition of `0..n` by variable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePartition {
    continuous: Vec<usize>,
    integer: Vec<usize>,
    binary: Vec<usize>,
    /// `locate[col] = (type, position inside that type's group)`
    locate: Vec<(VarType, usize)>,
}

impl VariablePartition {
    pub fn new(vtype: &[VarType]) -> Self {
        let mut partition = Self {
            continuous: Vec::new(),
            integer: Vec::new(),
            binary: Vec::new(),
            locate: Vec::with_capacity(vtype.len()),
        };
        for (col, &t) in vtype.iter().enumerate() {
            let group = partition.group_mut(t);
            let local = group.len();
            group.push(col);
            partition.locate.push((t, local));
        }
        partition
    }

    pub fn of(ir: &ProblemIr) -> Self {
        Self::new(ir.vtype())
    }

    fn group_mut(&mut self, t: VarType) -> &mut Vec<usize> {
        match t {
            VarType::Continuous => &mut self.continuous,
            VarType::Integer => &mut self.integer,
            VarType::Binary => &mut self.binary,
        }
    }

    /// Original column indices of type `t`, ascending.
    pub fn group(&self, t: VarType) -> &[usize] {
        match t {
            VarType::Continuous => &self.continuous,
            VarType::Integer => &self.integer,
            VarType::Binary => &self.binary,
        }
    }

    /// Non-empty groups in canonical order (continuous, integer, binary).
    pub fn non_empty(&self) -> impl Iterator<Item = (VarType, &[usize])> + '_ {
        [VarType::Continuous, VarType::Integer, VarType::Binary]
            .into_iter()
            .map(|t| (t, self.group(t)))
            .filter(|(_, cols)| !cols.is_empty())
    }

    /// Type and group-local position of an original column.
    pub fn locate(&self, col: usize) -> (VarType, usize) {
        self.locate[col]
    }

    pub fn len(&self) -> usize {
        self.locate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locate.is_empty()
    }

    /// Gather `values[col]` for every column of type `t`.
    pub fn slice<T: Copy>(&self, t: VarType, values: &[T]) -> Vec<T> {
        self.group(t).iter().map(|&col| values[col]).collect()
    }

    /// Scatter group-local values back to their original columns.
    pub fn scatter(&self, t: VarType, local: &[f64], out: &mut [f64]) {
        for (&col, &v) in self.group(t).iter().zip(local) {
            out[col] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VarType::*;

    #[test]
    fn test_groups_preserve_order() {
        let p = VariablePartition::new(&[Binary, Continuous, Integer, Continuous, Binary]);
        assert_eq!(p.group(Continuous), &[1, 3]);
        assert_eq!(p.group(Integer), &[2]);
        assert_eq!(p.group(Binary), &[0, 4]);
        assert_eq!(p.locate(3), (Continuous, 1));
        assert_eq!(p.locate(4), (Binary, 1));
    }

    #[test]
    fn test_empty_groups_skipped() {
        let p = VariablePartition::new(&[Continuous, Continuous]);
        let kinds: Vec<_> = p.non_empty().map(|(t, _)| t).collect();
        assert_eq!(kinds, vec![Continuous]);
        assert!(p.group(Integer).is_empty());
    }

    #[test]
    fn test_scatter_inverts_slice() {
        let p = VariablePartition::new(&[Integer, Continuous, Integer]);
        let values = [7.0, 8.0, 9.0];
        let mut out = [0.0; 3];
        for (t, _) in p.non_empty() {
            let local = p.slice(t, &values);
            p.scatter(t, &local, &mut out);
        }
        assert_eq!(out, values);
    }
}
