use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, SyntaxShape, Type,
};

use super::util::{from_json, labeled, to_json};
use crate::algo::dataset::SampleRecord;
use crate::ops;
use crate::BiodiversityPlugin;

pub struct TopSpecies;

impl PluginCommand for TopSpecies {
    type Plugin = BiodiversityPlugin;

    fn name(&self) -> &str {
        "biodiversity top-species"
    }

    fn description(&self) -> &str {
        "Rank the most abundant OTUs of a sample record for a horizontal bar chart"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_type(Type::record(), Type::record())
            .named(
                "count",
                SyntaxShape::Int,
                "Number of OTUs to keep (default: 10)",
                Some('n'),
            )
            .switch(
                "sort",
                "Sort observations by count before ranking",
                None,
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["top", "rank", "otu", "species", "bacteria"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "open samples.json | get samples | first | biodiversity top-species --count 10",
            description: "Top 10 OTUs of the first sample",
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
        let count: usize = call
            .get_flag::<i64>("count")?
            .unwrap_or(ops::DEFAULT_TOP_N as i64)
            .max(0) as usize;
        let sort = call.has_flag("sort")?;

        let value = input.into_value(head)?;
        let record: SampleRecord = serde_json::from_value(to_json(&value))
            .map_err(|e| labeled(e.into(), head))?;
        record.validate().map_err(|e| labeled(e, head))?;

        let result = ops::top_species_payload(&record, count, sort);
        Ok(PipelineData::Value(from_json(&result, head), None))
    }
}
