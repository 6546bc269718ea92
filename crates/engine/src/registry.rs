//! Name-keyed model registry.
//!
//! A registry owns one document's data dictionary and its top-level models.
//! It is immutable once built, so a single `Arc<ModelRegistry>` can serve
//! evaluations from any number of threads without locking.

use indexmap::IndexMap;
use rayon::prelude::*;
use sylva_core::config::DEFAULT_MAX_DEPTH;
use sylva_core::{DataDictionary, EvalError, Record, Result};
use tracing::debug;

use crate::evaluator::{EvaluationResult, ModelEvaluator};
use crate::schema::{DocumentMetadata, Model, ModelDocument};

/// The models of one document, looked up by name.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    metadata: DocumentMetadata,
    dictionary: DataDictionary,
    models: IndexMap<String, Model>,
    max_depth: usize,
}

impl ModelRegistry {
    /// Empty registry with the given metadata and field dictionary.
    pub fn new(metadata: DocumentMetadata, dictionary: DataDictionary) -> Self {
        Self {
            metadata,
            dictionary,
            models: IndexMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Build a registry from a parsed document.
    ///
    /// Fails with a structural error when two top-level models share a name.
    pub fn from_document(doc: ModelDocument) -> Result<Self> {
        let mut registry = Self::new(doc.metadata, doc.data_dictionary);
        for model in doc.models {
            registry.insert(model)?;
        }
        Ok(registry)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Register a model under its own name.
    pub fn insert(&mut self, model: Model) -> Result<()> {
        let name = model.name().to_string();
        if self.models.contains_key(&name) {
            return Err(EvalError::Structural(format!(
                "duplicate model name '{}' in document '{}'",
                name, self.metadata.id
            )));
        }
        self.models.insert(name, model);
        Ok(())
    }

    /// The model registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| EvalError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn dictionary(&self) -> &DataDictionary {
        &self.dictionary
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluator bound to this registry's dictionary and depth guard.
    pub fn evaluator(&self) -> ModelEvaluator<'_> {
        ModelEvaluator::new(&self.dictionary).with_max_depth(self.max_depth)
    }

    /// Look up `name` and evaluate it against `record`.
    pub fn evaluate(&self, name: &str, record: &Record) -> Result<EvaluationResult> {
        let model = self.lookup(name)?;
        self.evaluate_model(model, record)
    }

    /// Evaluate a model (registered here or not) with this registry's dictionary.
    pub fn evaluate_model(&self, model: &Model, record: &Record) -> Result<EvaluationResult> {
        self.evaluator().evaluate(model, record)
    }

    /// Evaluate many records against one model in parallel.
    ///
    /// Results are returned in input order; each record fails or succeeds
    /// independently.
    pub fn evaluate_batch(
        &self,
        name: &str,
        records: &[Record],
    ) -> Result<Vec<Result<EvaluationResult>>> {
        let model = self.lookup(name)?;
        debug!(model = name, records = records.len(), "evaluating batch");
        let evaluator = self.evaluator();
        Ok(records
            .par_iter()
            .map(|record| evaluator.evaluate(model, record))
            .collect())
    }

    /// Rebuild the document this registry was built from.
    pub fn to_document(&self) -> ModelDocument {
        let mut doc = ModelDocument::new(self.metadata.clone());
        doc.data_dictionary = self.dictionary.clone();
        doc.models = self.models.values().cloned().collect();
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        MiningModel, MultipleModelMethod, Node, Predicate, RuleSet, RuleSetModel, Segment,
        SelectionMethod, SimpleRule, TreeModel,
    };
    use sylva_core::FieldSpec;

    fn registry() -> ModelRegistry {
        let doc = ModelDocument::new(DocumentMetadata::new("demo", "Demo"))
            .with_field(FieldSpec::continuous("age"))
            .with_field(FieldSpec::categorical("color"))
            .with_model(TreeModel::new(
                "age-band",
                Node::new(Predicate::True)
                    .with_score("unknown")
                    .with_child(Node::leaf(Predicate::less_than("age", "18"), "minor"))
                    .with_child(Node::leaf(Predicate::True, "adult")),
            ))
            .with_model(RuleSetModel::new(
                "traffic",
                RuleSet::new(
                    SelectionMethod::FirstHit,
                    vec![
                        SimpleRule::new("R1", Predicate::equal("color", "red"), "stop").into(),
                        SimpleRule::new("R2", Predicate::True, "go").into(),
                    ],
                ),
            ));
        ModelRegistry::from_document(doc).unwrap()
    }

    #[test]
    fn lookup_by_name() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["age-band", "traffic"]);
        assert!(registry.lookup("traffic").is_ok());
        assert_eq!(
            registry.lookup("missing"),
            Err(EvalError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn evaluate_by_name() {
        let registry = registry();
        let result = registry
            .evaluate("traffic", &Record::new().with("color", "red"))
            .unwrap();
        assert_eq!(result.score, "stop");
        assert!(matches!(
            registry.evaluate("nope", &Record::new()),
            Err(EvalError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let doc = ModelDocument::new(DocumentMetadata::new("dup", "Dup"))
            .with_model(TreeModel::new("same", Node::leaf(Predicate::True, "a")))
            .with_model(TreeModel::new("same", Node::leaf(Predicate::True, "b")));
        assert!(matches!(
            ModelRegistry::from_document(doc),
            Err(EvalError::Structural(_))
        ));
    }

    #[test]
    fn batch_preserves_order() {
        let registry = registry();
        let records: Vec<Record> = (0..100)
            .map(|i| Record::new().with("age", i.to_string()))
            .collect();
        let results = registry.evaluate_batch("age-band", &records).unwrap();
        assert_eq!(results.len(), 100);
        for (i, result) in results.into_iter().enumerate() {
            let expected = if i < 18 { "minor" } else { "adult" };
            assert_eq!(result.unwrap().score, expected);
        }
    }

    #[test]
    fn batch_of_unknown_model_fails_up_front() {
        assert!(matches!(
            registry().evaluate_batch("nope", &[Record::new()]),
            Err(EvalError::NotFound(_))
        ));
    }

    #[test]
    fn concurrent_evaluation_matches_sequential() {
        let registry = registry();
        let records: Vec<Record> = ["red", "blue", "green", "red"]
            .iter()
            .map(|c| Record::new().with("color", *c))
            .collect();
        let expected: Vec<String> = records
            .iter()
            .map(|r| registry.evaluate("traffic", r).unwrap().score)
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        records
                            .iter()
                            .map(|r| registry.evaluate("traffic", r).unwrap().score)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn registry_depth_guard_applies() {
        let mut model: Model = TreeModel::new("leaf", Node::leaf(Predicate::True, "1")).into();
        for level in 0..4 {
            model = MiningModel::new(
                format!("m{}", level),
                MultipleModelMethod::SelectFirst,
                vec![Segment::new(Predicate::True, model)],
            )
            .into();
        }
        let doc = ModelDocument::new(DocumentMetadata::new("deep", "Deep")).with_model(model);
        let registry = ModelRegistry::from_document(doc).unwrap().with_max_depth(2);
        assert!(matches!(
            registry.evaluate("m3", &Record::new()),
            Err(EvalError::Structural(_))
        ));
    }

    #[test]
    fn to_document_round_trips() {
        let registry = registry();
        let rebuilt = ModelRegistry::from_document(registry.to_document()).unwrap();
        let record = Record::new().with("age", "12").with("color", "blue");
        for name in registry.names() {
            assert_eq!(
                registry.evaluate(name, &record).unwrap(),
                rebuilt.evaluate(name, &record).unwrap()
            );
        }
    }
}
