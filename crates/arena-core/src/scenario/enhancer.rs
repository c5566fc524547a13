//! Complexity Enhancer: layers multi-step requirements onto hard scenarios.
//!
//! Purely deterministic in the scenario's numeric fields. Each layer `i` in
//! `1..=complexity_layers` adds an implement / integrate / optimize triple,
//! and the time limit grows by a factor of `complexity_layers *
//! technical_depth`.

use crate::domain::Scenario;

const ULTRA_COMPLEX_SKILLS: [&str; 8] = [
    "Advanced Algorithm Design",
    "Multi-layer System Architecture",
    "Cross-domain Integration",
    "Performance Optimization",
    "Innovative Problem Solving",
    "Technical Iteration Management",
    "Scalability Engineering",
    "Advanced Debugging and Testing",
];

#[derive(Debug, Clone, Copy)]
pub struct ComplexityEnhancer {
    threshold: f64,
}

impl ComplexityEnhancer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn is_ultra_complex(&self, scenario_difficulty: f64) -> bool {
        scenario_difficulty >= self.threshold
    }

    /// Rewrite `scenario` if its difficulty reaches the threshold.
    ///
    /// Scenarios below the threshold, or already enhanced, are returned as is.
    pub fn enhance(&self, mut scenario: Scenario) -> Scenario {
        if scenario.ultra_complex || !self.is_ultra_complex(scenario.scenario_difficulty) {
            return scenario;
        }

        let layers = scenario.complexity_layers;
        let depth = scenario.technical_depth;

        for i in 1..=layers {
            scenario.objectives.extend([
                format!(
                    "Layer {i}: Implement an advanced solution requiring {depth} technical iterations"
                ),
                format!(
                    "Layer {i}: Integrate the solution with previous layers and validate cross-layer compatibility"
                ),
                format!(
                    "Layer {i}: Optimize performance and ensure scalability across all integrated components"
                ),
            ]);
            scenario.success_criteria.extend([
                format!("Layer {i}: Complete implementation with {depth} iterations"),
                format!("Layer {i}: Validate cross-layer integration"),
                format!("Layer {i}: Achieve performance benchmarks"),
            ]);
        }

        scenario.constraints.extend([
            format!("Must implement {layers} distinct solution layers"),
            format!("Each layer must have {depth} technical iterations"),
            "Solutions must be cross-compatible and scalable".to_string(),
            "Performance optimization required at each layer".to_string(),
            "Must demonstrate innovative problem-solving approaches".to_string(),
        ]);

        for skill in ULTRA_COMPLEX_SKILLS {
            if !scenario.required_skills.iter().any(|s| s == skill) {
                scenario.required_skills.push(skill.to_string());
            }
        }

        let factor = u64::from(layers) * u64::from(depth);
        scenario.time_limit_ms = scenario.time_limit_ms.saturating_mul(factor);
        scenario.description.push_str(&format!(
            " Ultra-complex: {layers} layers of {depth} technical iterations each."
        ));
        scenario.ultra_complex = true;
        scenario
    }
}
