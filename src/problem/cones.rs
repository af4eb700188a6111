//! Cone translation from canonical ordering to engine-native ordering.
//!
//! Canonical forms:
//! - second-order cone `[t, v_1, ..., v_k]`: `t >= ||v||_2`
//! - exponential cone `(x, y, z)`: `y >= z exp(x / z)`, `z > 0`
//!
//! Engines declare an explicit layout; translation is a pure reindexing of
//! variable indices and never touches values.

use super::ir::ProblemIr;

/// Member placement an engine expects for second-order cones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocOrder {
    /// `[t, v_1, ..., v_k]`
    HeadFirst,
    /// `[v_1, ..., v_k, t]`
    HeadLast,
}

/// Native cone conventions of one engine.
///
/// `exp[i]` names the canonical slot (0 = x, 1 = y, 2 = z) that fills native slot `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConeLayout {
    pub soc: SocOrder,
    pub exp: [usize; 3],
}

impl ConeLayout {
    /// Clarabel: SOC `(t, x)` with `t >= ||x||`, exponential `(a, b, c)` with `b exp(a / b) <= c`.
    pub const CLARABEL: ConeLayout = ConeLayout {
        soc: SocOrder::HeadFirst,
        exp: [0, 2, 1],
    };

    /// MOSEK-style primal exponential cone `x0 >= x1 exp(x2 / x1)`.
    pub const PEXP: ConeLayout = ConeLayout {
        soc: SocOrder::HeadFirst,
        exp: [1, 2, 0],
    };

    pub fn soc_members(&self, group: &[usize]) -> Vec<usize> {
        match self.soc {
            SocOrder::HeadFirst => group.to_vec(),
            SocOrder::HeadLast => group[1..]
                .iter()
                .chain(std::iter::once(&group[0]))
                .copied()
                .collect(),
        }
    }

    pub fn exp_members(&self, triplet: [usize; 3]) -> [usize; 3] {
        self.exp.map(|slot| triplet[slot])
    }
}

/// A cone constraint expressed in an engine's native member order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCone {
    SecondOrder(Vec<usize>),
    Exponential([usize; 3]),
}

/// Translate the requested cone classes of `ir` into `layout` order.
pub fn translate(ir: &ProblemIr, layout: &ConeLayout, soc: bool, exp: bool) -> Vec<NativeCone> {
    let mut out = Vec::new();
    if soc {
        out.extend(
            ir.qmat()
                .iter()
                .map(|group| NativeCone::SecondOrder(layout.soc_members(group))),
        );
    }
    if exp {
        out.extend(
            ir.xmat()
                .iter()
                .map(|&triplet| NativeCone::Exponential(layout.exp_members(triplet))),
        );
    }
    out
}
