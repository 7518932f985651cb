use crate::corpus::{DocumentCorpus, PromptCorpus};
use crate::errors::PlanError;
use crate::model::TestCase;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds the {model × active prompt × document} cross-product in generation
/// order: models outermost, then prompts, then documents. System and assistant
/// fragments only ever join a conversation through correlation.
///
/// Active prompts must have distinct base names, so that (model, document,
/// prompt family) identifies exactly one case.
pub fn generate_cases(
    models: &[String],
    prompts: &PromptCorpus,
    documents: &DocumentCorpus,
) -> Result<Vec<TestCase>, PlanError> {
    if models.is_empty() {
        return Err(PlanError::NoModels);
    }
    let active: Vec<_> = prompts.active().map(|p| Arc::new(p.clone())).collect();
    if active.is_empty() {
        return Err(PlanError::NoPrompts);
    }
    let mut families: HashMap<&str, &str> = HashMap::new();
    for p in &active {
        if let Some(first) = families.insert(p.base_name.as_str(), p.id.as_str()) {
            return Err(PlanError::DuplicateBaseName {
                base_name: p.base_name.clone(),
                first: first.to_string(),
                second: p.id.clone(),
            });
        }
    }
    if documents.is_empty() {
        return Err(PlanError::NoDocuments);
    }
    let docs: Vec<_> = documents.iter().map(|d| Arc::new(d.clone())).collect();

    let mut cases = Vec::with_capacity(models.len() * active.len() * docs.len());
    for model in models {
        for prompt in &active {
            for doc in &docs {
                cases.push(TestCase {
                    model: model.clone(),
                    prompt: Arc::clone(prompt),
                    document: Arc::clone(doc),
                });
            }
        }
    }
    Ok(cases)
}

/// Splits cases into per-model partitions, keeping first-seen model order and
/// the generation order inside each partition.
pub fn partition_by_model(cases: Vec<TestCase>) -> Vec<(String, Vec<TestCase>)> {
    let mut parts: Vec<(String, Vec<TestCase>)> = Vec::new();
    for case in cases {
        match parts.iter_mut().find(|(m, _)| *m == case.model) {
            Some((_, list)) => list.push(case),
            None => parts.push((case.model.clone(), vec![case])),
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentUnit, PromptUnit};
    use std::collections::HashSet;

    fn prompts() -> PromptCorpus {
        PromptCorpus::new(vec![
            PromptUnit::from_id("system_summary", "sys"),
            PromptUnit::from_id("user_summary", "usr"),
            PromptUnit::from_id("assistant_summary", "asst"),
            PromptUnit::from_id("risks", "legacy"),
        ])
    }

    fn docs(n: usize) -> DocumentCorpus {
        DocumentCorpus::new(
            (0..n)
                .map(|i| DocumentUnit {
                    id: format!("doc{i}"),
                    content: format!("text {i}"),
                })
                .collect(),
        )
    }

    #[test]
    fn cross_product_uses_only_active_prompts() -> anyhow::Result<()> {
        let models = vec!["a".to_string(), "b".to_string()];
        let cases = generate_cases(&models, &prompts(), &docs(3))?;
        assert_eq!(cases.len(), 2 * 2 * 3);
        assert!(cases.iter().all(|c| c.prompt.role.is_active()));

        let keys: HashSet<_> = cases
            .iter()
            .map(|c| (c.model.clone(), c.document.id.clone(), c.prompt.base_name.clone()))
            .collect();
        assert_eq!(keys.len(), cases.len());
        Ok(())
    }

    #[test]
    fn generation_order_is_model_prompt_document() -> anyhow::Result<()> {
        let models = vec!["a".to_string(), "b".to_string()];
        let cases = generate_cases(&models, &prompts(), &docs(2))?;
        let labels: Vec<_> = cases.iter().take(4).map(TestCase::label).collect();
        assert_eq!(
            labels,
            vec![
                "a/user_summary/doc0",
                "a/user_summary/doc1",
                "a/risks/doc0",
                "a/risks/doc1"
            ]
        );
        assert_eq!(cases[4].model, "b");
        Ok(())
    }

    #[test]
    fn fatal_conditions() {
        let models = vec!["a".to_string()];
        assert_eq!(
            generate_cases(&[], &prompts(), &docs(1)).unwrap_err(),
            PlanError::NoModels
        );
        assert_eq!(
            generate_cases(&models, &prompts(), &docs(0)).unwrap_err(),
            PlanError::NoDocuments
        );
        let only_system = PromptCorpus::new(vec![PromptUnit::from_id("system_x", "s")]);
        assert_eq!(
            generate_cases(&models, &only_system, &docs(1)).unwrap_err(),
            PlanError::NoPrompts
        );
    }

    #[test]
    fn legacy_and_user_prompt_with_same_family_are_rejected() {
        let corpus = PromptCorpus::new(vec![
            PromptUnit::from_id("summary", "legacy"),
            PromptUnit::from_id("user_summary", "usr"),
        ]);
        let err = generate_cases(&["m".to_string()], &corpus, &docs(1)).unwrap_err();
        assert_eq!(
            err,
            PlanError::DuplicateBaseName {
                base_name: "summary".into(),
                first: "summary".into(),
                second: "user_summary".into(),
            }
        );
        assert!(err.to_string().contains("'summary' and 'user_summary'"));
    }

    #[test]
    fn case_identity_is_unique() -> anyhow::Result<()> {
        let models = vec!["a".to_string(), "b".to_string()];
        let cases = generate_cases(&models, &prompts(), &docs(3))?;
        let triples: HashSet<_> = cases
            .iter()
            .map(|c| (&c.model, &c.document.id, &c.prompt.base_name))
            .collect();
        assert_eq!(triples.len(), cases.len());
        Ok(())
    }

    #[test]
    fn partitions_keep_order() -> anyhow::Result<()> {
        let models = vec!["b".to_string(), "a".to_string()];
        let cases = generate_cases(&models, &prompts(), &docs(2))?;
        let parts = partition_by_model(cases);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, "b");
        assert_eq!(parts[0].1.len(), 4);
        assert_eq!(parts[0].1[0].label(), "b/user_summary/doc0");
        Ok(())
    }
}
