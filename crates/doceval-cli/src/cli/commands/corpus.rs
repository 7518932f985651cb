use super::super::args::ConfigArg;
use crate::exit_codes::EXIT_SUCCESS;
use doceval_core::config::load_config;
use doceval_core::corpus::{DocumentCorpus, PromptCorpus};
use doceval_core::correlate::build_plan;
use doceval_core::model::{DocumentUnit, PromptRole, SystemSource};

/// How the system message of an active prompt will be resolved.
pub(crate) fn describe_system(source: &SystemSource) -> String {
    match source {
        SystemSource::Exact(id) => format!("system: {id}"),
        SystemSource::Fallback(id) => format!("system: {id} (fallback)"),
        SystemSource::Default => "system: built-in default".to_string(),
        SystemSource::None => "single message".to_string(),
    }
}

pub(crate) fn list(args: &ConfigArg) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)?;
    let prompts = PromptCorpus::load_dir(&cfg.prompts_dir)?;
    let documents = DocumentCorpus::load_dir(&cfg.documents_dir)?;
    let probe = DocumentUnit {
        id: String::new(),
        content: String::new(),
    };

    println!("prompts ({}):", prompts.len());
    for p in prompts.iter() {
        if matches!(p.role, PromptRole::User | PromptRole::Legacy) {
            let plan = build_plan(p, &prompts, &probe);
            println!(
                "  {:<32} {:<9} {:<20} {}",
                p.id,
                p.role,
                p.base_name,
                describe_system(&plan.system_source)
            );
        } else {
            println!("  {:<32} {:<9} {}", p.id, p.role, p.base_name);
        }
    }

    println!("documents ({}):", documents.len());
    for d in documents.iter() {
        println!("  {:<32} {} chars", d.id, d.content.chars().count());
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_descriptions() {
        assert_eq!(
            describe_system(&SystemSource::Fallback("system_other".into())),
            "system: system_other (fallback)"
        );
        assert_eq!(describe_system(&SystemSource::None), "single message");
    }
}
