//! Query pipeline against the in-memory index.
//!
//! Tests the flow: index → purify → classify → plan → search → cursor.

use nlsearch_classify::{ClassifierConfig, ClassifierKind};
use nlsearch_core::{Document, SearchBackend};
use nlsearch_grammar::question_grammar;
use nlsearch_query::{CursorState, DEFAULT_LIMIT, QueryExecutor, QueryPlanConfig};
use nlsearch_store::MemoryIndex;
use std::sync::Arc;

async fn index_with(documents: Vec<Document>) -> MemoryIndex {
    let index = MemoryIndex::default();
    let mut writer = index.writer().unwrap();
    for document in documents {
        writer.upsert(document).unwrap();
    }
    writer.commit().await.unwrap();
    index
}

fn executor(index: &MemoryIndex, kind: ClassifierKind) -> QueryExecutor {
    QueryExecutor::new(
        Arc::new(index.clone()),
        Arc::new(question_grammar().unwrap()),
        ClassifierConfig::default().with_kind(kind),
        QueryPlanConfig::default(),
        DEFAULT_LIMIT,
    )
}

fn newnode() -> Document {
    Document::new("/newnode")
        .with_field("jcr:description", "a repository is quite a thing")
        .with_field("jcr:primaryType", "nt:unstructured")
}

#[tokio::test]
async fn test_repository_question_finds_newnode() {
    let index = index_with(vec![newnode()]).await;
    let executor = executor(&index, ClassifierKind::Knn);

    let plan = executor.plan("what is the repository").await;
    assert!(plan.iter().any(|c| c.field == "jcr:description" && c.term == "repository"));

    let mut cursor = executor.execute("what is the repository").await.unwrap();
    assert_eq!(cursor.state(), CursorState::NotStarted);
    assert!(cursor.has_next());

    let row = cursor.try_next().unwrap();
    assert_eq!(row.path(), "/newnode");
    assert!(row.value("jcr:score").is_some());

    assert!(!cursor.has_next());
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.try_next().is_err());
}

#[tokio::test]
async fn test_type_boost_reorders_results() {
    let index = index_with(vec![
        Document::new("/content/admin")
            .with_field("jcr:title", "admin")
            .with_field("jcr:primaryType", "nt:folder"),
        Document::new("/home/users/admin")
            .with_field("jcr:title", "the admin")
            .with_field("jcr:primaryType", "rep:User"),
        Document::new("/home/users/anonymous")
            .with_field("jcr:title", "the anonymous user")
            .with_field("jcr:primaryType", "rep:User"),
    ])
    .await;

    let plain = executor(&index, ClassifierKind::None);
    let paths: Vec<String> = plain
        .execute("who is the admin")
        .await
        .unwrap()
        .map(|row| row.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/content/admin", "/home/users/admin"]);

    // "the" only appears in user titles, so both classifiers predict rep:User.
    for kind in [ClassifierKind::Knn, ClassifierKind::NaiveBayes] {
        let boosted = executor(&index, kind);
        let translation = boosted.translate("who is the admin").await;
        assert_eq!(
            translation.classification.map(|c| c.label),
            Some("rep:User".to_string()),
            "{kind}"
        );

        let paths: Vec<String> = boosted
            .execute("who is the admin")
            .await
            .unwrap()
            .map(|row| row.path().to_string())
            .collect();
        assert_eq!(paths[0], "/home/users/admin", "{kind}");
        assert_eq!(paths.len(), 3, "{kind}");
    }
}

#[tokio::test]
async fn test_retrain_after_commit() {
    let index = index_with(vec![newnode()]).await;
    let executor = executor(&index, ClassifierKind::Knn);

    // No titles yet: training fails and the plan has no type clause.
    assert_eq!(executor.plan("what is the repository").await.len(), 3);
    assert_eq!(executor.classifier().trained_generation().await, Some(1));

    let mut writer = index.writer().unwrap();
    writer
        .upsert(
            Document::new("/repo")
                .with_field("jcr:title", "repository")
                .with_field("jcr:primaryType", "nt:folder"),
        )
        .unwrap();
    writer.commit().await.unwrap();

    assert_eq!(executor.plan("what is the repository").await.len(), 4);
    assert_eq!(executor.classifier().trained_generation().await, Some(2));
}

#[tokio::test]
async fn test_closed_index_surfaces_error() {
    let index = index_with(vec![newnode()]).await;
    let executor = executor(&index, ClassifierKind::Knn);
    index.close();

    assert!(executor.execute("what is the repository").await.is_err());
    assert!(index.stats().await.is_err());
}
