//! Mutation document emitter

use std::fmt::Write as _;

use crate::merge::MergedDefinition;

/// Render `Create<M>Document` and `Update<M>Document` for every model
pub fn render_mutations(definition: &MergedDefinition) -> String {
    let mut out = String::from("// THIS FILE IS GENERATED, DO NOT EDIT!\nimport { gql } from 'graphql-tag'\n");
    for model in definition.model_names() {
        for action in ["Create", "Update"] {
            let _ = write!(
                out,
                "\nexport const {action}{model}Document = gql`\n  mutation {action}{model}($input: {action}{model}Input!) {{\n    {op}{model}(input: $input) {{\n      document {{\n        id\n      }}\n    }}\n  }}\n`\n",
                action = action,
                model = model,
                op = action.to_lowercase(),
            );
        }
    }
    out
}
