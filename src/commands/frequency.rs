use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type};

use super::util::{from_json, labeled, to_json};
use crate::ops;
use crate::BiodiversityPlugin;

pub struct Frequency;

impl PluginCommand for Frequency {
    type Plugin = BiodiversityPlugin;

    fn name(&self) -> &str {
        "biodiversity frequency"
    }

    fn description(&self) -> &str {
        "Count occurrences of each value in a list"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::List(Box::new(Type::Any)), Type::record())
            .named(
                "feature",
                SyntaxShape::String,
                "Normalize values for this feature before counting",
                Some('f'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["frequency", "count", "histogram", "tally", "categories"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "['M' 'F' 'M' 'Unknown'] | biodiversity frequency",
                description: "Count category occurrences",
                result: None,
            },
            Example {
                example: "['male' 'Male' null] | biodiversity frequency --feature gender",
                description: "Normalize gender values, then count them",
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
        let feature = call
            .get_flag::<String>("feature")?
            .map(|name| ops::parse_feature(&name))
            .transpose()
            .map_err(|e| labeled(e, head))?;

        let values: Vec<serde_json::Value> = input.into_iter().map(|v| to_json(&v)).collect();
        let result = ops::op_frequency(&values, feature);

        Ok(PipelineData::Value(from_json(&result, head), None))
    }
}
