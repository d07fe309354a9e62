use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type, Value,
};

use super::util::{from_json, labeled, to_json};
use crate::ops;
use crate::BiodiversityPlugin;

pub struct Normalize;

impl PluginCommand for Normalize {
    type Plugin = BiodiversityPlugin;

    fn name(&self) -> &str {
        "biodiversity normalize"
    }

    fn description(&self) -> &str {
        "Normalize raw demographic values into their display form"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::Any, Type::Any),
                (Type::List(Box::new(Type::Any)), Type::List(Box::new(Type::Any))),
            ])
            .required_named(
                "feature",
                SyntaxShape::String,
                "Feature: ethnicity, gender, age, location, bbtype, wfreq",
                Some('f'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["normalize", "clean", "demographic", "metadata", "unknown"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "'female' | biodiversity normalize --feature gender",
                description: "Capitalize the first letter of a gender value",
                result: Some(Value::test_string("Female")),
            },
            Example {
                example: "['Austin, TX' 'Tokyo, Japan'] | biodiversity normalize --feature location",
                description: "Reduce locations to their two-letter code where one exists",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &BiodiversityPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let feature_name: String = call.get_flag("feature")?.ok_or_else(|| {
            LabeledError::new("Missing --feature flag")
                .with_label("specify which feature the values belong to", head)
        })?;
        let feature = ops::parse_feature(&feature_name).map_err(|e| labeled(e, head))?;

        let value = input.into_value(head)?;
        let normalize_one = |v: &Value| {
            let raw = to_json(v);
            from_json(&ops::op_normalize(Some(&raw), feature), head)
        };

        let output = match &value {
            Value::List { vals, .. } => Value::list(vals.iter().map(normalize_one).collect(), head),
            single => normalize_one(single),
        };

        Ok(PipelineData::Value(output, None))
    }
}
