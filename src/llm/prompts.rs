//! Prompt templates for element documentation.

use crate::model::Element;

/// Prompt asking for narrative documentation of an element.
pub fn documentation_prompt(element: &Element) -> String {
    format!(
        "Analyze and document this {}:\n\n{}\nProvide: description, parameters, return value, usage notes.",
        element.kind.description().to_lowercase(),
        element.analysis_context()
    )
}

/// Prompt asking for usage examples.
pub fn usage_example_prompt(element: &Element) -> String {
    format!(
        "Generate practical usage examples for this {}:\n\n{}\nProvide: 2-3 examples with sample data, expected outputs, use cases.",
        element.kind.description().to_lowercase(),
        element.analysis_context()
    )
}

/// Prompt asking for unit tests.
pub fn unit_test_prompt(element: &Element) -> String {
    format!(
        "Generate comprehensive unit tests for this {}:\n\n{}\nProvide: normal cases, edge cases, error handling tests.",
        element.kind.description().to_lowercase(),
        element.analysis_context()
    )
}
