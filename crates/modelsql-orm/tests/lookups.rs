//! Lookup translation against a registry of related models.

use modelsql_core::model::{FieldDescriptor, ModelDescriptor, ModelRegistry, RelationshipDescriptor};
use modelsql_core::{Dialect, Settings};
use modelsql_orm::lookup::LookupTranslator;
use modelsql_orm::{LookupError, ModelContext};
use pretty_assertions::assert_eq;

fn blog() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .add(ModelDescriptor::new("Company").field(FieldDescriptor::short_text("name", 120)))
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Author")
                .field(FieldDescriptor::short_text("name", 80))
                .relation(RelationshipDescriptor::many_to_one("company", "Company").null()),
        )
        .unwrap();
    registry
        .add(ModelDescriptor::new("Tag").field(FieldDescriptor::short_text("label", 40)))
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Article")
                .field(FieldDescriptor::short_text("title", 200))
                .relation(RelationshipDescriptor::many_to_one("author", "Author"))
                .relation(
                    RelationshipDescriptor::many_to_one("editor", "Author").related_name("edited"),
                )
                .relation(RelationshipDescriptor::many_to_many("tags", "Tag")),
        )
        .unwrap();
    registry
}

#[test]
fn test_plain_tokens() {
    let settings = Settings::default();
    let translator = LookupTranslator::new(&settings);

    assert_eq!(
        translator.translate_where("nome__istartswith=Thiago"),
        "LOWER(nome) LIKE LOWER('Thiago%')"
    );
    assert_eq!(translator.translate_where("idade__gte=18"), "idade >= 18");
    assert_eq!(translator.translate_where("id__in=[1,2,3]"), "id IN (1, 2, 3)");
    assert_eq!(translator.translate_where("ativo__isnull=false"), "ativo IS NOT NULL");

    let translation = translator.translate_many(["nome###Thiago"]);
    assert_eq!(translation.where_clause(), "");
    assert_eq!(translation.rejected.len(), 1);
    assert_eq!(translation.rejected[0].token, "nome###Thiago");
}

#[test]
fn test_forward_joins_through_registry() {
    let registry = blog();
    let settings = Settings::default();
    let article = registry.get("Article").unwrap();
    let translator = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(article);

    let translation =
        translator.translate_many(["author.company.name__iexact=acme", "title__contains=rust"]);
    assert_eq!(
        translation.joins,
        [
            "INNER JOIN authors AS author ON author.id = articles.author_id",
            "INNER JOIN companys AS author__company ON author__company.id = author.company_id",
        ]
    );
    assert_eq!(
        translation.where_clause(),
        "LOWER(author__company.name) = LOWER('acme') AND articles.title LIKE '%rust%'"
    );
}

#[test]
fn test_many_to_many_forward_and_reverse() {
    let registry = blog();
    let settings = Settings::default();

    let article = registry.get("Article").unwrap();
    let forward = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(article)
        .translate_many(["tags.label=rust"]);
    assert_eq!(
        forward.joins,
        [
            "INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id",
            "INNER JOIN tags AS tags ON tags.id = tags__link.tag_id",
        ]
    );
    assert_eq!(forward.where_clause(), "tags.label = 'rust'");

    let tag = registry.get("Tag").unwrap();
    let reverse = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(tag)
        .translate_many(["article.id=5"]);
    assert_eq!(
        reverse.joins,
        [
            "INNER JOIN articles_tags AS article__link ON article__link.tag_id = tags.id",
            "INNER JOIN articles AS article ON article.id = article__link.article_id",
        ]
    );
    assert_eq!(reverse.where_clause(), "article.id = 5");
}

#[test]
fn test_reverse_foreign_key_hops() {
    let registry = blog();
    let settings = Settings::default();
    let author = registry.get("Author").unwrap();
    let translator = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(author);

    let edited = translator.translate_many(["edited.title__startswith=Draft"]);
    assert_eq!(
        edited.joins,
        ["INNER JOIN articles AS edited ON edited.editor_id = authors.id"]
    );
    assert_eq!(edited.where_clause(), "edited.title LIKE 'Draft%'");

    let plain = translator.translate_many(["article.title=x"]);
    assert_eq!(
        plain.joins,
        ["INNER JOIN articles AS article ON article.author_id = authors.id"]
    );
}

#[test]
fn test_ambiguous_reverse_hop() {
    let mut registry = ModelRegistry::new();
    registry
        .add(ModelDescriptor::new("Author").field(FieldDescriptor::short_text("name", 80)))
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Review")
                .relation(RelationshipDescriptor::many_to_one("writer", "Author"))
                .relation(RelationshipDescriptor::many_to_one("reviewer", "Author")),
        )
        .unwrap();

    let settings = Settings::default();
    let author = registry.get("Author").unwrap();
    let translation = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(author)
        .translate_many(["review.id=1", "name=Ana"]);

    assert_eq!(translation.joins, Vec::<String>::new());
    assert_eq!(translation.where_clause(), "name = 'Ana'");
    assert!(matches!(
        &translation.errors()[..],
        [LookupError::AmbiguousRelationship { segment, candidates, .. }]
            if segment == "review" && candidates.len() == 2
    ));
}

#[test]
fn test_oracle_joins_have_no_alias_keyword() {
    let ctx = ModelContext::new(Settings::new(Dialect::Oracle), blog());
    let sql = ctx
        .objects("Article")
        .unwrap()
        .filter(["author.name__icontains=ana"])
        .to_count_sql()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT COUNT(*) FROM articles INNER JOIN authors author ON author.id = articles.author_id \
         WHERE LOWER(author.name) LIKE LOWER('%ana%') ESCAPE '\\'"
    );
}

#[test]
fn test_unknown_relationship_segment() {
    let registry = blog();
    let settings = Settings::default();
    let article = registry.get("Article").unwrap();
    let translation = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(article)
        .translate_many(["publisher.name=x"]);
    assert_eq!(
        translation.errors(),
        [LookupError::UnresolvedRelationship {
            model: "Article".to_string(),
            segment: "publisher".to_string(),
        }]
    );
}

#[test]
fn test_backslash_values_cannot_end_literals() {
    let ctx = ModelContext::new(Settings::default(), blog());
    let sql = ctx
        .objects("Article")
        .unwrap()
        .filter([r"title=x\' OR 1=1 -- ", r"author.name__contains=50\"])
        .to_count_sql()
        .unwrap();
    assert_eq!(
        sql,
        r"SELECT COUNT(*) FROM articles INNER JOIN authors AS author ON author.id = articles.author_id WHERE articles.title = 'x\\'' OR 1=1 --' AND author.name LIKE '%50\\\\%'"
    );
}

#[test]
fn test_unresolved_target_is_rejected_with_registry() {
    let mut registry = ModelRegistry::new();
    registry
        .add(
            ModelDescriptor::new("Post")
                .field(FieldDescriptor::short_text("title", 200))
                .relation(RelationshipDescriptor::many_to_one("author", "Writer")),
        )
        .unwrap();

    let settings = Settings::default();
    let post = registry.get("Post").unwrap();
    let translation = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(post)
        .translate_many(["author.name=Ana", "title=x"]);

    assert_eq!(translation.joins, Vec::<String>::new());
    assert_eq!(translation.where_clause(), "title = 'x'");
    assert_eq!(
        translation.errors(),
        [LookupError::UnresolvedRelationship {
            model: "Post".to_string(),
            segment: "author".to_string(),
        }]
    );
}

#[test]
fn test_link_alias_never_matches_a_path_alias() {
    let mut registry = ModelRegistry::new();
    registry
        .add(ModelDescriptor::new("Link").field(FieldDescriptor::short_text("url", 200)))
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Tag")
                .field(FieldDescriptor::short_text("label", 40))
                .relation(RelationshipDescriptor::many_to_one("link", "Link").null()),
        )
        .unwrap();
    registry
        .add(
            ModelDescriptor::new("Article")
                .relation(RelationshipDescriptor::many_to_many("tags", "Tag")),
        )
        .unwrap();

    let settings = Settings::default();
    let article = registry.get("Article").unwrap();
    let translation = LookupTranslator::new(&settings)
        .with_registry(&registry)
        .for_model(article)
        .translate_many(["tags.link.url=x", "tags.label=rust"]);
    assert_eq!(
        translation.joins,
        [
            "INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id",
            "INNER JOIN tags AS tags ON tags.id = tags__link.tag_id",
            "INNER JOIN links AS tags__link_2 ON tags__link_2.id = tags.link_id",
        ]
    );
    assert_eq!(
        translation.where_clause(),
        "tags__link_2.url = 'x' AND tags.label = 'rust'"
    );
}

#[test]
fn test_related_paths_in_delete_and_order() {
    let ctx = ModelContext::new(Settings::default(), blog());
    let qs = ctx
        .objects("Article")
        .unwrap()
        .filter(["tags.label=rust"])
        .order_by("-author.company.name");

    assert_eq!(
        qs.to_select_sql().unwrap(),
        "SELECT articles.id, articles.title, articles.author_id, articles.editor_id FROM articles \
         INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id \
         INNER JOIN tags AS tags ON tags.id = tags__link.tag_id \
         LEFT OUTER JOIN authors AS author ON author.id = articles.author_id \
         LEFT OUTER JOIN companys AS author__company ON author__company.id = author.company_id \
         WHERE tags.label = 'rust' ORDER BY author__company.name DESC"
    );
    assert_eq!(
        qs.to_delete_sql().unwrap(),
        "DELETE articles FROM articles \
         INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id \
         INNER JOIN tags AS tags ON tags.id = tags__link.tag_id \
         WHERE tags.label = 'rust'"
    );

    let ctx = ModelContext::new(Settings::new(Dialect::PostgreSql), blog());
    let sql = ctx
        .objects("Article")
        .unwrap()
        .filter(["tags.label=rust"])
        .to_delete_sql()
        .unwrap();
    assert_eq!(
        sql,
        "DELETE FROM articles WHERE id IN (SELECT articles.id FROM articles \
         INNER JOIN articles_tags AS tags__link ON tags__link.article_id = articles.id \
         INNER JOIN tags AS tags ON tags.id = tags__link.tag_id \
         WHERE tags.label = 'rust')"
    );
}
