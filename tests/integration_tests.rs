use ndarray::arr2;
use recommender_engine::utils::load_id_list;
use recommender_engine::{
    render_recommendations, Config, EmbeddingStore, ModelPaths, Recommender, RecommenderError,
    RecommendationConfig,
};
use std::path::Path;

fn write_users(path: &Path) {
    EmbeddingStore::from_parts(
        vec!["u0".to_string(), "u1".to_string()],
        arr2(&[[1.0f32, 0.0], [0.0, 1.0]]),
    )
    .unwrap()
    .save(path)
    .unwrap();
}

fn write_items(path: &Path) {
    EmbeddingStore::from_parts(
        vec!["i0".to_string(), "i1".to_string(), "i2".to_string()],
        arr2(&[[1.0f32, 0.0], [0.6, 0.8], [-1.0, 0.0]]),
    )
    .unwrap()
    .save(path)
    .unwrap();
}

fn test_config(dir: &Path) -> Config {
    Config {
        model_paths: ModelPaths {
            user_embeddings: dir.join("user_embeddings.bin"),
            item_embeddings: dir.join("item_embeddings.bin"),
        },
        data_paths: None,
        recommendation: RecommendationConfig {
            top_k: 2,
            similarity_threshold: 0.0,
            embedding_dim: Some(2),
            validate_normalization: false,
            query_timeout_ms: None,
        },
    }
}

fn setup(dir: &Path) -> Recommender {
    write_users(&dir.join("user_embeddings.bin"));
    write_items(&dir.join("item_embeddings.bin"));
    Recommender::open(test_config(dir)).unwrap()
}

#[test]
fn recommends_top_items_above_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = setup(dir.path());

    // u0 = [1, 0]: i0 scores 1.0, i1 scores 0.6, i2 (-1.0) is excluded
    let recommendations = recommender.recommend("u0").unwrap();
    assert_eq!(recommendations, vec!["i0".to_string(), "i1".to_string()]);

    let scored = recommender.recommend_scored("u0").unwrap();
    assert!((scored[0].1 - 1.0).abs() < 1e-6);
    assert!((scored[1].1 - 0.6).abs() < 1e-6);
}

#[test]
fn unknown_user_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = setup(dir.path());

    let err = recommender.recommend("nobody").unwrap_err();
    assert!(matches!(err, RecommenderError::NotFound(_)));

    // A per-query failure leaves the service usable
    assert!(!recommender.recommend("u0").unwrap().is_empty());
}

#[test]
fn pairwise_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = setup(dir.path());

    assert!((recommender.similarity("u0", "i0").unwrap() - 1.0).abs() < 1e-6);
    assert!((recommender.similarity("u0", "i2").unwrap() + 1.0).abs() < 1e-6);

    let err = recommender.similarity("u0", "missing_item").unwrap_err();
    assert!(matches!(err, RecommenderError::NotFound(_)));
}

#[test]
fn reload_swaps_snapshot_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = setup(dir.path());

    assert_eq!(recommender.recommend("u0").unwrap()[0], "i0");

    // Retrain: a fresh item universe lands on disk, then one reload
    EmbeddingStore::from_parts(vec!["j0".to_string()], arr2(&[[1.0f32, 0.0]]))
        .unwrap()
        .save(&dir.path().join("item_embeddings.bin"))
        .unwrap();
    recommender.reload().unwrap();

    assert_eq!(recommender.recommend("u0").unwrap(), vec!["j0".to_string()]);
}

#[test]
fn failed_reload_keeps_serving_old_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let recommender = setup(dir.path());

    std::fs::write(dir.path().join("item_embeddings.bin"), [1, 2, 3]).unwrap();
    assert!(recommender.reload().is_err());

    // Queries still run against the previous snapshot
    assert_eq!(recommender.recommend("u0").unwrap()[0], "i0");
}

#[test]
fn mismatched_store_dimensions_fail_at_open() {
    let dir = tempfile::tempdir().unwrap();
    write_users(&dir.path().join("user_embeddings.bin"));
    EmbeddingStore::from_parts(vec!["i0".to_string()], arr2(&[[1.0f32, 0.0, 0.0]]))
        .unwrap()
        .save(&dir.path().join("item_embeddings.bin"))
        .unwrap();

    let err = Recommender::open(test_config(dir.path())).unwrap_err();
    assert!(matches!(err, RecommenderError::DimensionMismatch { .. }));
}

#[test]
fn unnormalized_vector_rejected_when_validating() {
    let dir = tempfile::tempdir().unwrap();
    write_users(&dir.path().join("user_embeddings.bin"));
    EmbeddingStore::from_parts(vec!["i0".to_string()], arr2(&[[3.0f32, 4.0]]))
        .unwrap()
        .save(&dir.path().join("item_embeddings.bin"))
        .unwrap();

    // Compatible by default
    assert!(Recommender::open(test_config(dir.path())).is_ok());

    let mut config = test_config(dir.path());
    config.recommendation.validate_normalization = true;
    let err = Recommender::open(config).unwrap_err();
    match err {
        RecommenderError::UnnormalizedVector { id, magnitude } => {
            assert_eq!(id, "i0");
            assert!((magnitude - 5.0).abs() < 1e-5);
        }
        other => panic!("expected UnnormalizedVector, got {:?}", other),
    }
}

#[test]
fn config_parses_deployment_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "model_paths": {
                "user_embeddings": "user_embeddings.bin",
                "item_embeddings": "item_embeddings.bin"
            },
            "data_paths": {
                "users": "users.txt",
                "items": "items.txt"
            },
            "recommendation": {
                "top_k": 10,
                "similarity_threshold": 0.7,
                "embedding_dim": 64
            },
            "training": {
                "factors": 64,
                "regularization": 0.01,
                "iterations": 20
            }
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.recommendation.top_k, 10);
    assert!((config.recommendation.similarity_threshold - 0.7).abs() < 1e-6);
    assert_eq!(config.recommendation.embedding_dim, Some(64));
    assert!(!config.recommendation.validate_normalization);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, RecommenderError::Config(_)));

    std::fs::write(
        &path,
        r#"{
            "model_paths": {
                "user_embeddings": "u.bin",
                "item_embeddings": "i.bin"
            },
            "recommendation": {
                "top_k": 0,
                "similarity_threshold": 0.0
            }
        }"#,
    )
    .unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, RecommenderError::Config(_)));
}

#[test]
fn output_line_format_is_stable() {
    let rendered = render_recommendations(
        "u0",
        &["i0".to_string(), "i1".to_string()],
    );
    assert_eq!(rendered, "Recommendations for user u0:\n- i0\n- i1\n");

    // Empty results still succeed with just the header
    assert_eq!(
        render_recommendations("u1", &[]),
        "Recommendations for user u1:\n"
    );
}

#[test]
fn id_list_skips_empty_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.txt");
    std::fs::write(&path, "i0\n\ni1\ni2\n").unwrap();

    assert_eq!(load_id_list(&path).unwrap(), vec!["i0", "i1", "i2"]);
}
