//! Circuit compilation: and-inverter graph to BDD.
//!
//! Gates are evaluated in reverse post-order of a depth-first traversal from
//! the output, so every operand is built before its consumers regardless of
//! the order in which gates are listed. Each gate result is retained while it
//! still has pending consumers and released right after the last one.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::aig::{AndGate, Circuit, Literal};
use crate::bdd::Bdd;
use crate::error::{BddError, Result};
use crate::reference::Ref;
use crate::types::Var;

/// The compiled output of a circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCircuit {
    /// Retained edge of the circuit output.
    pub output: Ref,
    /// One variable per primary input, in input order.
    pub inputs: Vec<Var>,
}

impl CompiledCircuit {
    /// Gives the output edge back to the manager.
    pub fn release(self, bdd: &Bdd) {
        bdd.release(self.output);
    }
}

enum Mark {
    InProgress,
    Done,
}

/// Compiles `circuit` into `bdd`, creating one fresh variable per primary input.
///
/// Fails with [`BddError::MalformedCircuit`] on invalid input literals, gate
/// redefinitions, dangling references and cyclic gate dependencies.
pub fn compile(bdd: &Bdd, circuit: &Circuit) -> Result<CompiledCircuit> {
    let (input_indices, gates) = index_gates(circuit)?;
    let order = topological_order(circuit, &input_indices, &gates)?;
    debug!("Gate order: {} of {} gates reachable", order.len(), circuit.gates.len());

    let mut inputs = Vec::with_capacity(circuit.inputs.len());
    let mut input_edges: HashMap<u32, Ref> = HashMap::new();
    for lit in &circuit.inputs {
        let var = bdd.new_var();
        input_edges.insert(lit.index(), bdd.mk_var(var)?);
        inputs.push(var);
    }

    // Remaining consumers of each gate output.
    let mut fanout: HashMap<u32, usize> = HashMap::new();
    for gate in &order {
        for rhs in [gate.rhs0, gate.rhs1] {
            if gates.contains_key(&rhs.index()) {
                *fanout.entry(rhs.index()).or_insert(0) += 1;
            }
        }
    }

    let mut threshold = bdd.config().reorder_threshold;
    let mut edges: HashMap<u32, Ref> = HashMap::new();
    let resolve = |edges: &HashMap<u32, Ref>, lit: Literal| -> Result<Ref> {
        let index = lit.index();
        let base = if index == 0 {
            Ref::ZERO
        } else if let Some(&r) = input_edges.get(&index) {
            r
        } else if let Some(&r) = edges.get(&index) {
            r
        } else {
            return Err(BddError::InconsistentState(format!("literal {} used before it was built", lit)));
        };
        Ok(base.negate_if(lit.is_negated()))
    };

    for gate in &order {
        let a = resolve(&edges, gate.rhs0)?;
        let b = resolve(&edges, gate.rhs1)?;
        let r = bdd.apply_and(a, b)?;
        bdd.retain(r);
        edges.insert(gate.lhs.index(), r);
        debug!("gate {} -> {}", gate, r);

        for rhs in [gate.rhs0, gate.rhs1] {
            if let Some(count) = fanout.get_mut(&rhs.index()) {
                *count -= 1;
                if *count == 0 {
                    if let Some(edge) = edges.remove(&rhs.index()) {
                        bdd.release(edge);
                    }
                }
            }
        }

        if bdd.config().auto_reorder && bdd.live_nodes() > threshold {
            bdd.collect_garbage();
            if bdd.live_nodes() > threshold {
                info!("Live nodes {} exceed {}, reordering", bdd.live_nodes(), threshold);
                bdd.reorder_all()?;
                threshold = threshold.saturating_mul(2);
            }
        }
    }

    let output = resolve(&edges, circuit.output)?;
    bdd.retain(output);
    for (_, edge) in edges.drain() {
        bdd.release(edge);
    }
    for (_, edge) in input_edges.drain() {
        bdd.release(edge);
    }
    bdd.collect_garbage();

    if bdd.config().reorder_on_finish {
        bdd.reorder_all()?;
    }

    info!(
        "Compiled circuit: {} inputs, {} gates, output {} with {} nodes",
        inputs.len(),
        order.len(),
        output,
        bdd.node_count(&[output])
    );
    Ok(CompiledCircuit { output, inputs })
}

/// Validates inputs and gate definitions.
///
/// Returns the set of input indices and the gates keyed by their lhs index.
fn index_gates(circuit: &Circuit) -> Result<(HashSet<u32>, HashMap<u32, &AndGate>)> {
    let mut input_indices = HashSet::new();
    for &lit in &circuit.inputs {
        if lit.is_negated() || lit.is_constant() {
            return Err(BddError::MalformedCircuit(format!("invalid input literal {}", lit)));
        }
        if !input_indices.insert(lit.index()) {
            return Err(BddError::MalformedCircuit(format!("input literal {} is declared twice", lit)));
        }
    }

    let mut gates = HashMap::new();
    for gate in &circuit.gates {
        let lhs = gate.lhs;
        if lhs.is_negated() || lhs.is_constant() {
            return Err(BddError::MalformedCircuit(format!("invalid gate output in '{}'", gate)));
        }
        if input_indices.contains(&lhs.index()) {
            return Err(BddError::MalformedCircuit(format!("gate '{}' redefines input {}", gate, lhs)));
        }
        if gates.insert(lhs.index(), gate).is_some() {
            return Err(BddError::MalformedCircuit(format!("literal {} is defined twice", lhs)));
        }
    }
    Ok((input_indices, gates))
}

/// Gates reachable from the output, operands before consumers.
fn topological_order<'a>(
    circuit: &Circuit,
    input_indices: &HashSet<u32>,
    gates: &HashMap<u32, &'a AndGate>,
) -> Result<Vec<&'a AndGate>> {
    let is_input = |index: u32| input_indices.contains(&index);

    let out = circuit.output.index();
    if out != 0 && !is_input(out) && !gates.contains_key(&out) {
        return Err(BddError::MalformedCircuit(format!(
            "output literal {} is not defined",
            circuit.output
        )));
    }

    let mut marks: HashMap<u32, Mark> = HashMap::new();
    let mut order = Vec::new();
    let mut stack: Vec<(u32, usize)> = Vec::new();
    if gates.contains_key(&out) {
        marks.insert(out, Mark::InProgress);
        stack.push((out, 0));
    }

    while let Some((index, next)) = stack.pop() {
        let gate = gates[&index];
        let operands = [gate.rhs0, gate.rhs1];
        if next == operands.len() {
            marks.insert(index, Mark::Done);
            order.push(gate);
            continue;
        }
        stack.push((index, next + 1));

        let child = operands[next].index();
        if child == 0 || is_input(child) {
            continue;
        }
        if !gates.contains_key(&child) {
            return Err(BddError::MalformedCircuit(format!(
                "gate '{}' references undefined literal {}",
                gate, operands[next]
            )));
        }
        match marks.get(&child) {
            Some(Mark::Done) => {}
            Some(Mark::InProgress) => {
                return Err(BddError::MalformedCircuit(format!(
                    "cyclic dependency through gate '{}'",
                    gate
                )));
            }
            None => {
                marks.insert(child, Mark::InProgress);
                stack.push((child, 0));
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bdd::BddConfig;

    fn lit(raw: u32) -> Literal {
        Literal::new(raw)
    }

    fn gate(lhs: u32, rhs0: u32, rhs1: u32) -> AndGate {
        AndGate::new(lit(lhs), lit(rhs0), lit(rhs1))
    }

    fn quiet() -> Bdd {
        Bdd::with_config(BddConfig::default().with_auto_reorder(false).with_reorder_on_finish(false))
    }

    fn assert_matches_simulation(bdd: &Bdd, circuit: &Circuit, compiled: &CompiledCircuit) {
        let n = circuit.num_inputs();
        let table = bdd.truth_table(compiled.output, &compiled.inputs);
        for (row, &value) in table.iter().enumerate() {
            let values: Vec<bool> = (0..n).map(|i| (row >> i) & 1 == 1).collect();
            assert_eq!(value, circuit.simulate(&values).unwrap(), "row {:?}", values);
        }
    }

    #[test]
    fn test_single_and() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2), lit(4)], vec![gate(6, 2, 4)], lit(6));

        let compiled = compile(&bdd, &circuit).unwrap();

        assert_eq!(compiled.inputs.len(), 2);
        assert_eq!(bdd.node_count(&[compiled.output]), 2);
        assert_eq!(bdd.live_nodes(), 2);
        assert_matches_simulation(&bdd, &circuit, &compiled);
    }

    #[test]
    fn test_contradiction_is_constant_false() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2)], vec![gate(4, 2, 3)], lit(4));

        let compiled = compile(&bdd, &circuit).unwrap();

        assert!(bdd.is_zero(compiled.output));
        assert_eq!(bdd.live_nodes(), 0);
    }

    #[test]
    fn test_gates_out_of_order() {
        let bdd = quiet();
        // out = ~(in0 & ~in1) & (in1 | in2), listed consumers first
        let circuit = Circuit::new(
            vec![lit(2), lit(4), lit(6)],
            vec![gate(12, 9, 11), gate(10, 5, 7), gate(8, 2, 5)],
            lit(12),
        );

        let compiled = compile(&bdd, &circuit).unwrap();
        assert_matches_simulation(&bdd, &circuit, &compiled);
        bdd.check_invariants(&[compiled.output]).unwrap();
    }

    #[test]
    fn test_negated_output_and_shared_operands() {
        let bdd = quiet();
        // g = in0 & in0, out = ~(g & ~in1)
        let circuit = Circuit::new(vec![lit(2), lit(4)], vec![gate(6, 2, 2), gate(8, 6, 5)], lit(9));

        let compiled = compile(&bdd, &circuit).unwrap();
        assert_matches_simulation(&bdd, &circuit, &compiled);
    }

    #[test]
    fn test_output_is_input_or_constant() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2), lit(4)], vec![], lit(5));
        let compiled = compile(&bdd, &circuit).unwrap();
        assert_matches_simulation(&bdd, &circuit, &compiled);

        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2)], vec![], Literal::TRUE);
        let compiled = compile(&bdd, &circuit).unwrap();
        assert!(bdd.is_one(compiled.output));
    }

    #[test]
    fn test_unreachable_gates_are_skipped() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2), lit(4)], vec![gate(6, 2, 4), gate(8, 3, 5)], lit(6));

        let compiled = compile(&bdd, &circuit).unwrap();
        assert_eq!(bdd.live_nodes(), 2);
        assert_matches_simulation(&bdd, &circuit, &compiled);
    }

    #[test]
    fn test_dangling_reference() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2)], vec![gate(6, 2, 4)], lit(6));

        let err = compile(&bdd, &circuit).unwrap_err();
        assert_eq!(
            err,
            BddError::MalformedCircuit("gate '6 = 2 & 4' references undefined literal 4".to_string())
        );
    }

    #[test]
    fn test_undefined_output() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2)], vec![], lit(8));
        assert!(matches!(compile(&bdd, &circuit), Err(BddError::MalformedCircuit(_))));
    }

    #[test]
    fn test_cycle() {
        let bdd = quiet();
        let circuit = Circuit::new(vec![lit(2)], vec![gate(4, 6, 2), gate(6, 4, 2)], lit(4));

        let err = compile(&bdd, &circuit).unwrap_err();
        assert!(matches!(err, BddError::MalformedCircuit(ref msg) if msg.contains("cyclic")));
    }

    #[test]
    fn test_invalid_definitions() {
        let bdd = quiet();
        let redefined = Circuit::new(vec![lit(2), lit(4)], vec![gate(6, 2, 4), gate(6, 3, 4)], lit(6));
        assert!(compile(&bdd, &redefined).is_err());

        let shadows_input = Circuit::new(vec![lit(2), lit(4)], vec![gate(4, 2, 2)], lit(4));
        assert!(compile(&bdd, &shadows_input).is_err());

        let negated_input = Circuit::new(vec![lit(3)], vec![], lit(3));
        assert!(compile(&bdd, &negated_input).is_err());

        let duplicate_input = Circuit::new(vec![lit(2), lit(2)], vec![], lit(2));
        assert!(compile(&bdd, &duplicate_input).is_err());
    }

    #[test]
    fn test_auto_reorder_during_build() {
        let config = BddConfig::default().with_reorder_threshold(8);
        let bdd = Bdd::with_config(config);

        // Comparator with all a's before all b's: a bad initial order.
        let k = 5u32;
        let a = |i: u32| 2 * (i + 1);
        let b = |i: u32| 2 * (k + i + 1);
        let inputs = (0..2 * k).map(|i| lit(2 * (i + 1))).collect();
        let mut gates = Vec::new();
        let mut next = 2 * (2 * k + 1);
        let mut acc = 1;
        for i in 0..k {
            // eq_i = ~(a & ~b) & ~(~a & b)
            let (p, q, eq) = (next, next + 2, next + 4);
            gates.push(gate(p, a(i), b(i) + 1));
            gates.push(gate(q, a(i) + 1, b(i)));
            gates.push(gate(eq, p + 1, q + 1));
            let conj = next + 6;
            gates.push(gate(conj, acc, eq));
            acc = conj;
            next += 8;
        }
        let circuit = Circuit::new(inputs, gates, lit(acc));

        let compiled = compile(&bdd, &circuit).unwrap();
        assert_matches_simulation(&bdd, &circuit, &compiled);
        bdd.check_invariants(&[compiled.output]).unwrap();
        // Any order with all a's above all b's needs at least 2^k nodes.
        assert!(bdd.node_count(&[compiled.output]) < 1 << k);
    }

    #[test]
    fn test_long_and_chain() {
        let bdd = quiet();
        let n = 6_000u32;
        let input = |i: u32| lit(2 * i);
        let inputs = (1..=n).map(input).collect();

        // acc = in1 & (in2 & (... & in(n-1))), then out = acc & in(n) reaches through every level.
        let mut gates = Vec::new();
        let mut next = n + 1;
        let mut acc = input(n - 1);
        for i in (1..n - 1).rev() {
            gates.push(AndGate::new(lit(2 * next), input(i), acc));
            acc = lit(2 * next);
            next += 1;
        }
        let out = lit(2 * next);
        gates.push(AndGate::new(out, acc, input(n)));
        let circuit = Circuit::new(inputs, gates, out);

        let compiled = compile(&bdd, &circuit).unwrap();

        assert_eq!(bdd.node_count(&[compiled.output]), n as usize);
        assert_eq!(bdd.live_nodes(), n as usize);
        assert!(bdd.evaluate(compiled.output, |_| true));
        assert!(!bdd.evaluate(compiled.output, |v| v != compiled.inputs[n as usize - 1]));
        assert!(!bdd.evaluate(compiled.output, |v| v != compiled.inputs[0]));
    }
}
