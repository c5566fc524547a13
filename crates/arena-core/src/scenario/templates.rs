//! Base scenario templates, one per category, and their progressive variants.

use crate::domain::{Category, Variant};

pub struct CategoryTemplate {
    pub title: &'static str,
    pub prompt: &'static str,
    pub objectives: &'static [&'static str],
    pub constraints: &'static [&'static str],
    pub success_criteria: &'static [&'static str],
    pub skills: &'static [&'static str],
}

pub fn template(category: Category) -> &'static CategoryTemplate {
    match category {
        Category::Knowledge => &KNOWLEDGE,
        Category::CodeQuality => &CODE_QUALITY,
        Category::Security => &SECURITY,
        Category::Performance => &PERFORMANCE,
        Category::Innovation => &INNOVATION,
        Category::SelfImprovement => &SELF_IMPROVEMENT,
        Category::Collaboration => &COLLABORATION,
        Category::Experimental => &EXPERIMENTAL,
    }
}

static KNOWLEDGE: CategoryTemplate = CategoryTemplate {
    title: "Knowledge Verification",
    prompt: "Explain a core concept of distributed systems and apply it to a concrete design.",
    objectives: &[
        "Explain the concept of eventual consistency and its practical implications",
        "Describe how consensus protocols tolerate node failures",
        "Apply both concepts to the design of a replicated key-value store",
    ],
    constraints: &[
        "Use precise terminology",
        "Support every claim with a concrete example",
    ],
    success_criteria: &[
        "Explanations are technically correct",
        "The design applies the explained concepts",
    ],
    skills: &["Distributed Systems", "Technical Communication", "System Design"],
};

static CODE_QUALITY: CategoryTemplate = CategoryTemplate {
    title: "Code Quality Review",
    prompt: "Review and refactor a legacy module with tangled responsibilities.",
    objectives: &[
        "Identify duplicated validation logic and extract it",
        "Separate input parsing from business rules",
        "Introduce unit tests covering the refactored behaviour",
    ],
    constraints: &[
        "Keep the public interface stable",
        "No behaviour changes without a failing test first",
    ],
    success_criteria: &[
        "All existing behaviour preserved",
        "Each function has a single responsibility",
    ],
    skills: &["Refactoring", "Testing", "Code Review"],
};

static SECURITY: CategoryTemplate = CategoryTemplate {
    title: "Security Audit",
    prompt: "You are a security consultant auditing a web authentication system.",
    objectives: &[
        "Identify injection and authentication vulnerabilities",
        "Assess session management and credential storage",
        "Propose prioritized remediations with threat justification",
    ],
    constraints: &[
        "Follow responsible disclosure practice",
        "Rank findings by exploitability and impact",
    ],
    success_criteria: &[
        "Critical vulnerabilities identified",
        "Remediations are specific and actionable",
    ],
    skills: &["Threat Modeling", "Secure Coding", "Vulnerability Assessment"],
};

static PERFORMANCE: CategoryTemplate = CategoryTemplate {
    title: "Performance Optimization",
    prompt: "A data pipeline misses its latency target under peak load.",
    objectives: &[
        "Profile the pipeline and locate the dominant bottleneck",
        "Optimize memory allocation in the hot path",
        "Verify throughput improvement with a reproducible benchmark",
    ],
    constraints: &[
        "Preserve output correctness",
        "Report measurements before and after every change",
    ],
    success_criteria: &[
        "Latency target met under peak load",
        "Benchmark methodology is reproducible",
    ],
    skills: &["Profiling", "Algorithm Optimization", "Benchmarking"],
};

static INNOVATION: CategoryTemplate = CategoryTemplate {
    title: "Innovation Challenge",
    prompt: "Design a novel approach to a problem existing tools solve poorly.",
    objectives: &[
        "Analyze the limitations of existing approaches",
        "Propose an original solution architecture",
        "Validate feasibility with a minimal prototype plan",
    ],
    constraints: &[
        "The proposal must differ materially from existing tools",
        "State assumptions explicitly",
    ],
    success_criteria: &[
        "The approach is original and feasible",
        "Trade-offs are acknowledged",
    ],
    skills: &["Creative Problem Solving", "Architecture", "Prototyping"],
};

static SELF_IMPROVEMENT: CategoryTemplate = CategoryTemplate {
    title: "Self-Improvement Analysis",
    prompt: "Reflect on your recent performance and plan concrete improvements.",
    objectives: &[
        "Analyze recurring weaknesses in previous answers",
        "Define measurable improvement goals",
        "Design a feedback loop that tracks progress",
    ],
    constraints: &[
        "Goals must be measurable",
        "Reference specific past outcomes",
    ],
    success_criteria: &[
        "Weaknesses are identified honestly",
        "The improvement plan is actionable",
    ],
    skills: &["Self Assessment", "Learning Strategy", "Metrics Design"],
};

static COLLABORATION: CategoryTemplate = CategoryTemplate {
    title: "Cross-Agent Collaboration",
    prompt: "Coordinate with other agents to deliver a shared feature.",
    objectives: &[
        "Decompose the feature into independently deliverable tasks",
        "Define interfaces and handoff contracts between agents",
        "Resolve conflicting proposals into a single integration plan",
    ],
    constraints: &[
        "Every task has exactly one owner",
        "Interfaces are agreed before implementation starts",
    ],
    success_criteria: &[
        "The integration plan is conflict-free",
        "Handoff contracts are unambiguous",
    ],
    skills: &["Coordination", "Interface Design", "Conflict Resolution"],
};

static EXPERIMENTAL: CategoryTemplate = CategoryTemplate {
    title: "Experimental Validation",
    prompt: "Design an experiment that tests a hypothesis about system behaviour.",
    objectives: &[
        "Formulate a falsifiable hypothesis",
        "Design controlled experiments with clear metrics",
        "Interpret results and state confidence in conclusions",
    ],
    constraints: &[
        "Control for confounding variables",
        "Define success metrics before running anything",
    ],
    success_criteria: &[
        "The hypothesis is falsifiable",
        "Conclusions follow from the data",
    ],
    skills: &["Experimental Design", "Statistics", "Critical Thinking"],
};

/// Extra objectives unlocked cumulatively per band above basic.
const VARIANT_OBJECTIVES: [&str; 5] = [
    "Explain the reasoning behind each decision",
    "Handle edge cases and failure modes explicitly",
    "Compare at least two alternative approaches and justify the choice",
    "Provide a verification strategy for the complete solution",
    "Generalize the solution beyond the stated problem",
];

/// Objectives added on top of the base template for `variant`.
pub fn variant_objectives(variant: Variant) -> &'static [&'static str] {
    &VARIANT_OBJECTIVES[..variant.level()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_complete_template() {
        for category in Category::ALL {
            let t = template(category);
            assert!(!t.title.is_empty());
            assert!(!t.objectives.is_empty());
            assert!(!t.constraints.is_empty());
            assert!(!t.success_criteria.is_empty());
            assert!(!t.skills.is_empty());
        }
    }

    #[test]
    fn variants_add_objectives_progressively() {
        assert!(variant_objectives(Variant::Basic).is_empty());
        assert_eq!(variant_objectives(Variant::Advanced).len(), 2);
        assert_eq!(variant_objectives(Variant::Legendary).len(), 5);
    }
}
