// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write as _;
use std::time::Duration;

use criterion::Criterion;

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<usize>().ok()).unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<u64>().ok()).unwrap_or(default)
}

pub fn criterion() -> Criterion {
    let sample_size = env_usize("BENCH_SAMPLE_SIZE", 60).clamp(10, 200);
    let warmup_secs = env_u64("BENCH_WARMUP_SECS", 3).clamp(1, 60);
    let measurement_secs = env_u64("BENCH_MEASUREMENT_SECS", 5).clamp(1, 120);

    Criterion::default()
        .sample_size(sample_size)
        .warm_up_time(Duration::from_secs(warmup_secs))
        .measurement_time(Duration::from_secs(measurement_secs))
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    Medium,
    Large,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    fn shape(self) -> (usize, usize) {
        // (problems, steps per problem)
        match self {
            Self::Small => (1, 3),
            Self::Medium => (4, 5),
            Self::Large => (12, 8),
        }
    }
}

/// A solve-flow response; every third step carries a flowchart fence.
pub fn solve_response(case: Case) -> String {
    let (problems, steps) = case.shape();
    let mut out = String::new();
    for problem in 0..problems {
        if problem > 0 {
            out.push_str("---PROBLEM_SEPARATOR---\n");
        }
        let _ = writeln!(
            out,
            "### PROBLEM_TEXT\nProblem {problem}: simplify $x^{problem} + {problem}x$.\n"
        );
        out.push_str("### EXPLANATION\n");
        for step in 1..=steps {
            let _ = writeln!(out, "#### Step {step}: Transform {step}");
            let _ = writeln!(
                out,
                "Rewrite the term as $$ {step}x + {problem} = 0 $$ and keep going.\n"
            );
            if step % 3 == 0 {
                let _ = writeln!(
                    out,
                    "```plot-mermaid\ngraph TD\n  S{step}[Start {step}] --> M{step}{{Check}}\n  M{step} -->|ok| E{step}[Done]\n  M{step} -->|retry| S{step}\n```\n"
                );
            }
        }
        let _ = writeln!(out, "### ANSWER\n$$ x = -{problem} $$");
    }
    out
}
