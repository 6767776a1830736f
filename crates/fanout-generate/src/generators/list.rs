use fanout_core::ParameterSet;

/// Declared parameter sets, unchanged and in declaration order.
pub fn generate(sets: &[ParameterSet]) -> Vec<ParameterSet> {
    sets.to_vec()
}
