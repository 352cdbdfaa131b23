use std::rc::Rc;

use tracing::warn;

use bubble_motion::motion::{
    MotionConfigPatch, MotionEngine, MotionResult, SimulationNode, UpdateSummary,
};
use bubble_motion::records::DataRecord;

use super::super::{MotionTuning, UpdateCounts, ViewModel};

impl From<&UpdateSummary> for UpdateCounts {
    fn from(summary: &UpdateSummary) -> Self {
        Self {
            added: summary.added.len(),
            updated: summary.updated.len(),
            removed: summary.removed.len(),
        }
    }
}

pub(in crate::app) fn field_names(records: &[DataRecord]) -> Vec<String> {
    let mut names = records
        .iter()
        .flat_map(DataRecord::field_names)
        .collect::<Vec<_>>();
    names.sort();
    names.dedup();
    names
}

impl ViewModel {
    /// Creates the engine once the canvas has a size.
    pub(in crate::app) fn ensure_engine(&mut self) {
        if self.engine.is_some() || self.viewport.size().is_none() {
            return;
        }

        let mut engine = match MotionEngine::new(self.viewport.clone(), self.config.clone()) {
            Ok(engine) => engine,
            Err(error) => {
                warn!(%error, "motion engine could not be created");
                self.engine_error = Some(error.to_string());
                return;
            }
        };

        let frame = Rc::clone(&self.frame);
        engine.set_commit_sink(move |nodes: &[SimulationNode]| frame.borrow_mut().store(nodes));
        match engine.update_nodes(self.records.clone()) {
            Ok(summary) => self.last_update = Some(UpdateCounts::from(&summary)),
            Err(error) => self.engine_error = Some(error.to_string()),
        }
        if self.live_motion {
            engine.start();
        }

        self.tuning = MotionTuning::from_config(engine.config());
        self.engine = Some(engine);
    }

    pub(in crate::app) fn replace_records(&mut self, records: Vec<DataRecord>) {
        self.field_names = field_names(&records);
        self.records = records;
        self.records_revision += 1;
        self.search_match_cache = None;

        let records = self.records.clone();
        let counts = self.with_engine(|engine| {
            let summary = engine.update_nodes(records)?;
            Ok(UpdateCounts::from(&summary))
        });
        if counts.is_some() {
            self.last_update = counts;
        }

        let selected_exists = match (&self.selected, &self.engine) {
            (Some(key), Some(engine)) => engine.node(key).is_some(),
            _ => false,
        };
        if !selected_exists {
            self.selected = None;
        }
    }

    /// Runs `operation` on the engine, keeping the error for the UI.
    pub(in crate::app) fn with_engine<T>(
        &mut self,
        operation: impl FnOnce(&mut MotionEngine) -> MotionResult<T>,
    ) -> Option<T> {
        let engine = self.engine.as_mut()?;
        match operation(engine) {
            Ok(value) => {
                self.engine_error = None;
                Some(value)
            }
            Err(error) => {
                warn!(%error, "motion engine operation failed");
                self.engine_error = Some(error.to_string());
                None
            }
        }
    }

    pub(in crate::app) fn apply_patch(&mut self, patch: MotionConfigPatch) {
        self.with_engine(|engine| engine.set_motion_config(&patch));
        self.sync_tuning();
    }

    pub(in crate::app) fn sync_tuning(&mut self) {
        if let Some(engine) = &self.engine {
            self.tuning = MotionTuning::from_config(engine.config());
        }
    }
}

#[cfg(test)]
mod tests {
    use bubble_motion::motion::{DensityPreset, MotionConfig};
    use bubble_motion::records::demo_records;

    use super::*;

    #[test]
    fn field_names_are_sorted_and_unique() {
        let records = vec![
            DataRecord::new("a", 1.0).with_category("x").with_field("tier", "gold"),
            DataRecord::new("b", 1.0).with_group("g").with_field("tier", "silver"),
        ];

        assert_eq!(field_names(&records), vec!["category", "group", "tier"]);
    }

    #[test]
    fn engine_keeps_explicit_values_over_the_config_preset() {
        let patch: MotionConfigPatch =
            serde_json::from_str(r#"{"density": "dense", "collide_padding": 6.0}"#)
                .expect("patch parses");
        let mut config = MotionConfig::default();
        config.apply_patch(&patch).expect("patch applies");

        let mut model = ViewModel::new("test".to_owned(), demo_records(4), config);
        model.viewport.set_size(1200.0, 800.0);
        model.ensure_engine();

        let engine = model.engine.as_ref().expect("engine created");
        assert_eq!(engine.density(), DensityPreset::Dense);
        assert_eq!(engine.config().collide_padding, 6.0);
        assert_eq!(model.tuning.collide_padding, 6.0);
        assert_eq!(model.tuning.density, DensityPreset::Dense);
    }
}
