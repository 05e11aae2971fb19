use std::sync::{Arc, Mutex};

use crate::domain::step::StepResult;

/// Receives each chain step result as soon as it is produced.
pub trait StepSink: Send + Sync {
    fn emit(&self, result: &StepResult);
}

#[derive(Clone, Default)]
pub struct InMemoryStepSink {
    results: Arc<Mutex<Vec<StepResult>>>,
}

impl InMemoryStepSink {
    pub fn results(&self) -> Vec<StepResult> {
        match self.results.lock() {
            Ok(results) => results.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StepSink for InMemoryStepSink {
    fn emit(&self, result: &StepResult) {
        match self.results.lock() {
            Ok(mut results) => results.push(result.clone()),
            Err(poisoned) => poisoned.into_inner().push(result.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chain::catalog::STEPS;
    use crate::domain::step::StepResult;
    use crate::sink::{InMemoryStepSink, StepSink};

    #[test]
    fn in_memory_sink_keeps_emission_order() {
        let sink = InMemoryStepSink::default();
        sink.emit(&StepResult::new(&STEPS[0], "seed"));
        sink.emit(&StepResult::new(&STEPS[1], "describe"));

        let results = sink.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].text, "describe");
    }

    #[test]
    fn clones_share_the_same_buffer() {
        let sink = InMemoryStepSink::default();
        let observer = sink.clone();
        sink.emit(&StepResult::new(&STEPS[2], "segments"));
        assert_eq!(observer.results().len(), 1);
    }
}
