//! Filters flowing through the builder, the store requests and a recording
//! vector store.

use sift::adapters::mock::RecordingVectorStore;
use sift::error::{FilterError, NetworkError, SiftError};
use sift::filter::constructors::{self, in_list, index, not};
use sift::filter::{collect_fields, compile, ComputedExpr, FilterBuilder, Position};
use sift::store::{CreateRequest, DeleteRequest, Document, RetrieveRequest};
use sift::traits::VectorStore;

fn corpus() -> Vec<Document> {
    vec![
        Document::new("a", "rust async runtimes")
            .with_metadata("lang", "en")
            .with_metadata("year", 2021),
        Document::new("b", "parser combinators").with_metadata("lang", "en"),
        Document::new("c", "zero copy decoding").with_metadata("lang", "de"),
    ]
}

#[test]
fn builder_matches_parsed_text() {
    let built = FilterBuilder::new()
        .eq("lang", "en")
        .gte("year", 2020)
        .not(|b| b.in_list("tags", ["draft", "spam"]))
        .build()
        .unwrap()
        .unwrap();

    let parsed =
        compile("lang == 'en' and year >= 2020 and not (tags in ('draft', 'spam'))").unwrap();
    assert_eq!(built, parsed);
    assert_eq!(collect_fields(&built), vec!["lang", "year", "tags"]);
}

#[test]
fn canonical_text_reparses_to_same_tree() {
    let sources = [
        "a == 2 or b == 1 and not (c like 'x%')",
        "(a == 1 or b == 2) and m['k'][3] != 'z'",
        "x in ('one', 'two') or y < -2.5",
        "not (not (flag == true))",
    ];
    for source in sources {
        let expr = compile(source).unwrap();
        let canonical = expr.to_string();
        assert_eq!(compile(&canonical).unwrap(), expr, "{}", canonical);
        assert_eq!(compile(&canonical).unwrap().to_string(), canonical);
    }
}

#[test]
fn errors_point_at_the_offending_token() {
    let err = compile("name == 'a' and\n  tags[true] == 1").unwrap_err();
    assert_eq!(err, FilterError::BooleanIndex { pos: Position::new(2, 8) });

    let err = compile("x in (1, 'a')").unwrap_err();
    assert!(matches!(err, FilterError::HeterogeneousList { .. }));

    // A lone parenthesised value is a group, not a list.
    let err = compile("x in (1)").unwrap_err();
    assert!(matches!(
        err,
        FilterError::InvalidOperand { ref op, pos: Some(pos), .. }
            if op == "in" && pos == Position::new(1, 7)
    ));
    assert!(matches!(
        compile("x in (a == 1)").unwrap_err(),
        FilterError::InvalidOperand { .. }
    ));
}

#[test]
fn typed_constructors_compose_with_text() {
    let score: ComputedExpr = compile("score < 0.3").unwrap().try_into().unwrap();
    let expr = constructors::and(in_list(index("meta", "tags"), ["x"]), not(score));
    assert_eq!(expr.to_string(), "meta['tags'] in ('x') and not (score < 0.3)");
}

#[tokio::test]
async fn store_round_trip_through_json() {
    let store = RecordingVectorStore::new();
    store.create(&CreateRequest::new(corpus())).await.unwrap();

    let request = RetrieveRequest::new("decoding")
        .with_top_k(2)
        .with_min_similarity(0.25)
        .with_filter(compile("lang in ('en', 'de') and year > 2000").unwrap());

    // What a remote backend would receive.
    let wire = serde_json::to_string(&request).unwrap();
    let received: RetrieveRequest = serde_json::from_str(&wire).unwrap();
    assert_eq!(received, request);

    let docs = store.retrieve(&received).await.unwrap();
    assert_eq!(docs.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(store.retrieve_requests().len(), 1);
}

#[tokio::test]
async fn built_filters_with_unwritable_parts_are_refused() {
    let store = RecordingVectorStore::new();

    for filter in [
        constructors::eq("Like", "x"),
        constructors::eq("user id", 3),
        constructors::gte("score", f64::NAN),
    ] {
        let request = RetrieveRequest::new("q").with_filter(filter);
        let err = store.retrieve(&request).await.unwrap_err();
        assert!(matches!(err, SiftError::Filter(FilterError::InvalidOperand { .. })));
        assert!(serde_json::to_string(&request).is_err());
    }
    assert!(store.retrieve_requests().is_empty());

    let ok = RetrieveRequest::new("q").with_filter(constructors::eq("order_no", 3));
    let wire = serde_json::to_string(&ok).unwrap();
    assert_eq!(serde_json::from_str::<RetrieveRequest>(&wire).unwrap(), ok);
}

#[tokio::test]
async fn invalid_requests_never_reach_the_backend() {
    let store = RecordingVectorStore::new();

    store
        .retrieve(&RetrieveRequest::new("q").with_filter(constructors::gt("age", 1)))
        .await
        .unwrap();

    let bad = RetrieveRequest::new("q").with_filter(constructors::ident("age"));
    let err = store.retrieve(&bad).await.unwrap_err();
    assert!(matches!(err, SiftError::Filter(FilterError::InvalidOperand { .. })));

    let err = store.delete(&DeleteRequest { filter: None }).await.unwrap_err();
    assert_eq!(err, SiftError::Filter(FilterError::NilRoot));

    assert_eq!(store.retrieve_requests().len(), 1);
    assert!(store.delete_requests().is_empty());
}

#[tokio::test]
async fn backend_failures_surface_as_network_errors() {
    let store = RecordingVectorStore::new();
    store.fail_with(NetworkError::HttpStatus {
        status: 502,
        message: "bad gateway".to_string(),
    });

    let err = store
        .delete(&DeleteRequest::new(compile("lang == 'de'").unwrap()))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, SiftError::Network(NetworkError::HttpStatus { status: 502, .. })));
}
