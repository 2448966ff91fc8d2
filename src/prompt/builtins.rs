// Copyright 2026 Refit contributors
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Built-in prompt templates.
//!
//! Fixed instructional strings keyed by command name. These are authored
//! content, not computed; user-configured overrides take precedence over
//! every entry here.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Built-in command templates, in declaration order.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "refactor_function",
        "Refactor the following code to eliminate redundancy and improve maintainability by applying the DRY (Don't Repeat Yourself) principle. Identify repeated code patterns and abstract them into reusable functions or classes as appropriate.",
    ),
    (
        "refactor_components",
        "Analyze the following code and split it into smaller, more manageable components. Focus on identifying reusable parts, separating concerns, and improving overall component structure. Provide the refactored code.",
    ),
    (
        "refactor_solid",
        "Please refactor the following code to better adhere to SOLID principles. Focus on Single Responsibility, Open-Closed, Liskov Substitution, Interface Segregation, and Dependency Inversion where applicable. Explain your changes briefly in comments.",
    ),
    (
        "refactor_if_else",
        "Refactor the following code to completely eliminate nested if-else structures. Use strategies like early returns, guard clauses, and polymorphism to improve clarity and readability. Explore switch statements and design patterns like strategy or state to ensure the code remains maintainable.",
    ),
    (
        "refactor_performance",
        "Review the following code and optimize it for better performance. Focus on algorithmic efficiency, reducing unnecessary computations, and improving data structure usage. If applicable, consider asynchronous operations and memory management.",
    ),
    (
        "refactor_security",
        "Review the following code and enhance its security measures. Focus on identifying and mitigating common vulnerabilities such as SQL injection, XSS, CSRF, and insecure data handling",
    ),
    (
        "refactor_concurrency",
        "Refactor the following  code to improve its concurrency and multithreading capabilities. Focus on efficient resource sharing, preventing race conditions, and enhancing overall parallel processing performance.",
    ),
];

static LOOKUP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BUILTIN_TEMPLATES.iter().copied().collect());

/// Look up the built-in template for a command.
pub fn builtin_template(command: &str) -> Option<&'static str> {
    LOOKUP.get(command).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_count() {
        assert_eq!(BUILTIN_TEMPLATES.len(), 7);
    }

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin_template("refactor_function")
            .unwrap()
            .contains("DRY"));
        assert!(builtin_template("refactor_solid").unwrap().contains("SOLID"));
        assert!(builtin_template("unknown_command").is_none());
    }

    #[test]
    fn test_lookup_matches_table() {
        for (name, body) in BUILTIN_TEMPLATES {
            assert_eq!(builtin_template(name), Some(*body));
        }
    }
}
