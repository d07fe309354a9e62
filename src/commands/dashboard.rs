use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};

use super::util::{from_json, labeled, to_json};
use crate::algo::aggregate::UnknownPolicy;
use crate::algo::dataset::Dataset;
use crate::ops;
use crate::BiodiversityPlugin;

pub struct Dashboard;

impl PluginCommand for Dashboard {
    type Plugin = BiodiversityPlugin;

    fn name(&self) -> &str {
        "biodiversity dashboard"
    }

    fn description(&self) -> &str {
        "Build every chart payload for one sample and metadata feature"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::record(), Type::record())
            .required_named(
                "sample",
                SyntaxShape::String,
                "Sample name, e.g. 940",
                Some('s'),
            )
            .named(
                "feature",
                SyntaxShape::String,
                "Feature for the distribution chart (default: ethnicity)",
                Some('f'),
            )
            .named(
                "count",
                SyntaxShape::Int,
                "Number of OTUs in the top-species chart (default: 10)",
                Some('n'),
            )
            .switch(
                "keep-unknown",
                "Keep \"Unknown\" entries in histogram series",
                None,
            )
            .switch(
                "sort",
                "Sort observations by count before ranking",
                None,
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["dashboard", "belly", "button", "biodiversity", "chart", "plot"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open samples.json | biodiversity dashboard --sample 940 --feature wfreq",
            description: "All chart payloads for sample 940 with a wash-frequency histogram",
            result: None,
        }]
    }

    fn run(
        &self,
        _plugin: &BiodiversityPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let sample: String = call.get_flag("sample")?.ok_or_else(|| {
            LabeledError::new("Missing --sample flag")
                .with_label("specify the sample to render", head)
        })?;
        let feature_name: String = call
            .get_flag::<String>("feature")?
            .unwrap_or_else(|| "ethnicity".into());
        let count: usize = call
            .get_flag::<i64>("count")?
            .unwrap_or(ops::DEFAULT_TOP_N as i64)
            .max(0) as usize;
        let policy = UnknownPolicy::from_keep(call.has_flag("keep-unknown")?);
        let sort = call.has_flag("sort")?;

        let feature = ops::parse_feature(&feature_name).map_err(|e| labeled(e, head))?;
        let value = input.into_value(head)?;
        let dataset = Dataset::from_value(to_json(&value)).map_err(|e| labeled(e, head))?;

        let result = ops::op_dashboard(&dataset, &sample, feature, count, policy, sort)
            .map_err(|e| labeled(e, head))?;
        Ok(PipelineData::Value(from_json(&result, head), None))
    }
}
