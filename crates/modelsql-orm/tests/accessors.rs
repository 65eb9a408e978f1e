//! Accessor generation end to end: generated filters must translate.

use std::fs;

use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
use modelsql_core::Settings;
use modelsql_orm::{AccessorSynthesizer, AppendPatcher, ModelContext, SourcePatcher};
use pretty_assertions::assert_eq;

fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .add(ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40)))
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Article")
                .field(FieldDescriptor::short_text("title", 200))
                .relation(RelationshipDescriptor::many_to_many("tags", "Tag")),
        )
        .unwrap();
    registry
}

#[test]
fn test_many_to_many_accessors() {
    let registry = registry();
    let synthesizer = AccessorSynthesizer::new(&registry, "src");
    let (pairs, errors) = synthesizer.synthesize_all();
    assert!(errors.is_empty());
    assert_eq!(pairs.len(), 1);

    let pair = &pairs[0];
    assert_eq!(pair.owner.model, "Article");
    assert_eq!(pair.owner.method, "tags");
    assert!(pair
        .owner
        .text
        .contains("Tag::objects(ctx).filter([format!(\"article.id={}\", self.id)])"));
    assert_eq!(pair.target.model, "Tag");
    assert_eq!(pair.target.method, "article_set");
    assert!(pair
        .target
        .text
        .contains("Article::objects(ctx).filter([format!(\"tags.id={}\", self.id)])"));
}

#[test]
fn test_generated_tokens_translate() {
    let ctx = ModelContext::new(Settings::default(), registry());

    let tags_of_article = ctx
        .objects("Tag")
        .unwrap()
        .filter([format!("article.id={}", 7)])
        .to_select_sql()
        .unwrap();
    assert_eq!(
        tags_of_article,
        "SELECT tags.id, tags.label FROM tags \
         INNER JOIN articles_tags AS article__link ON article__link.tag_id = tags.id \
         INNER JOIN articles AS article ON article.id = article__link.article_id \
         WHERE article.id = 7"
    );

    let articles_of_tag = ctx
        .objects("Article")
        .unwrap()
        .filter([format!("tags.id={}", 3)])
        .to_select_sql()
        .unwrap();
    assert_eq!(
        articles_of_tag,
        "SELECT articles.id, articles.title FROM articles \
         INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id \
         INNER JOIN tags AS tags ON tags.id = tags__link.tag_id \
         WHERE tags.id = 3"
    );
}

#[test]
fn test_patching_twice_leaves_one_copy() {
    let registry = registry();
    let dir = tempfile::tempdir().unwrap();
    let synthesizer = AccessorSynthesizer::new(&registry, dir.path());
    let (pairs, _) = synthesizer.synthesize_all();

    let mut patcher = AppendPatcher;
    for _ in 0..2 {
        for pair in &pairs {
            patcher.apply(pair).unwrap();
        }
    }

    let tag = fs::read_to_string(dir.path().join("tag.rs")).unwrap();
    assert_eq!(tag.matches("pub fn article_set<'c>").count(), 1);
    let article = fs::read_to_string(dir.path().join("article.rs")).unwrap();
    assert_eq!(article.matches("impl Article {").count(), 1);
}
