//! Unit tests for child context derivation and path templates

use serde_json::json;
use skills_catalog_extractor::config::RunConfig;
use skills_catalog_extractor::extractor::{ContextPropagator, ExtractError, PathTemplate};
use skills_catalog_extractor::SkillCategory;

fn config() -> RunConfig {
    RunConfig::new("https://api.example.com", "k", "US")
}

#[test]
fn test_industry_context_renders_skill_path() {
    let ctx = ContextPropagator::INDUSTRY
        .derive_child_context(&json!({"id": "I1", "name": "Tech"}), &config())
        .unwrap();

    assert_eq!(ctx.parent_key, "industry_id");
    assert_eq!(ctx.parent_id, "I1");
    assert_eq!(ctx.country_code, "US");
    assert_eq!(
        ctx.render(&PathTemplate::INDUSTRY_SKILLS, Some(SkillCategory::Trending))
            .unwrap(),
        "/industries/I1/skills/trending"
    );
}

#[test]
fn test_occupation_context_renders_detail_path() {
    let ctx = ContextPropagator::OCCUPATION
        .derive_child_context(&json!({"id": "O9"}), &config())
        .unwrap();

    assert_eq!(
        ctx.render(&PathTemplate::OCCUPATION_DETAIL, None).unwrap(),
        "/occupations/O9"
    );
}

#[test]
fn test_missing_parent_id() {
    let result =
        ContextPropagator::OCCUPATION.derive_child_context(&json!({"name": "x"}), &config());
    assert!(matches!(
        result,
        Err(ExtractError::MissingIdentifier { entity: "occupation", field: "id" })
    ));
}

#[test]
fn test_unbound_placeholder() {
    let ctx = ContextPropagator::INDUSTRY
        .derive_child_context(&json!({"id": "I1"}), &config())
        .unwrap();

    // The occupation template needs a variable the industry context lacks
    assert!(matches!(
        ctx.render(&PathTemplate::OCCUPATION_SKILLS, Some(SkillCategory::Emerging)),
        Err(ExtractError::Template(_))
    ));
    // `{category}` unbound
    assert!(matches!(
        ctx.render(&PathTemplate::INDUSTRY_SKILLS, None),
        Err(ExtractError::Template(_))
    ));
}

#[test]
fn test_unterminated_placeholder() {
    let template = PathTemplate::new("/industries/{industry_id");
    let ctx = ContextPropagator::INDUSTRY
        .derive_child_context(&json!({"id": "I1"}), &config())
        .unwrap();
    assert!(matches!(ctx.render(&template, None), Err(ExtractError::Template(_))));
}
