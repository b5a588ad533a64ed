//! Tool catalog adapter
//!
//! Maps tool host descriptors onto model-callable function specs.

use crate::core::ToolSpec;
use crate::mcp::ToolDescriptor;

/// Convert descriptors to function specs, one for one and in order
///
/// Missing descriptions become empty strings; schemas pass through untouched.
pub fn to_function_specs(descriptors: &[ToolDescriptor]) -> Vec<ToolSpec> {
    descriptors
        .iter()
        .map(|tool| ToolSpec {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: tool.input_schema.clone(),
        })
        .collect()
}
